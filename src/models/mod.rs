mod audit_event;
mod group;
mod project;
mod refresh_token;
mod user;

pub use audit_event::AuditEvent;
pub use group::{Group, GroupMember, GroupWithMembers, Student};
pub use project::{Project, ProjectView, PublicProject};
pub use refresh_token::RefreshToken;
pub use user::User;
