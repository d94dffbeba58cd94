use std::fmt;

pub const ALL_MEALS: &str = "allMeals";
pub const BLOGS: &str = "blogs";
pub const USERS: &str = "users";
pub const REQUESTED_MEALS: &str = "requestedMeals";
pub const REVIEWS: &str = "reviews";
pub const USER_PACKAGES: &str = "userPackages";
pub const LAWYERS: &str = "lawyers";
pub const COMMENTS: &str = "comments";
pub const RATINGS: &str = "ratings";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Meals,
    Blogs,
    Users,
    RequestedMeals,
    Reviews,
    UserPackages,
    Lawyers,
    Comments,
    Ratings,
}

impl Collection {
    pub const ALL: [Collection; 9] = [
        Collection::Meals,
        Collection::Blogs,
        Collection::Users,
        Collection::RequestedMeals,
        Collection::Reviews,
        Collection::UserPackages,
        Collection::Lawyers,
        Collection::Comments,
        Collection::Ratings,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Meals => ALL_MEALS,
            Collection::Blogs => BLOGS,
            Collection::Users => USERS,
            Collection::RequestedMeals => REQUESTED_MEALS,
            Collection::Reviews => REVIEWS,
            Collection::UserPackages => USER_PACKAGES,
            Collection::Lawyers => LAWYERS,
            Collection::Comments => COMMENTS,
            Collection::Ratings => RATINGS,
        }
    }

    /// Field sets that must be unique across the collection.
    pub fn unique_keys(self) -> &'static [&'static [&'static str]] {
        match self {
            Collection::Users => &[&["email"]],
            Collection::Lawyers => &[&["lawyer_email"]],
            Collection::Ratings => &[&["lawyerId", "userId"]],
            _ => &[],
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
