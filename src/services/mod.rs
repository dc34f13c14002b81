//! Business logic for each resource. Services load documents through
//! `DatabaseService`, apply the domain rules from `models`, and save them back.

mod connections;
mod jobs;
mod posts;
mod profiles;
mod users;

pub use connections::ConnectionService;
pub use jobs::JobService;
pub use posts::PostService;
pub use profiles::ProfileService;
pub use users::UserService;
