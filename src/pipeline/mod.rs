pub mod search;
pub mod upload;

pub use search::SearchPipeline;
pub use upload::UploadPipeline;
