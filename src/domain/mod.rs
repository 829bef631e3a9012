pub mod folder;
pub mod image;
pub mod retry_record;
pub mod session;
pub mod share;
pub mod user;

pub use folder::Folder;
pub use image::Image;
pub use retry_record::{FailedEmbedRequest, FailedIndexDeletion, RequestStatus};
pub use session::Session;
pub use share::{FolderShare, Permission};
pub use user::User;
