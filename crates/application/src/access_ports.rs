mod activity;
mod logins;
mod profiles;
mod roles;

pub use activity::{ActivityLogQuery, ActivityLogRepository};
pub use logins::LoginEventRepository;
pub use profiles::{ProfileRepository, UserListFilter, load_ancestry};
pub use roles::RoleRepository;
