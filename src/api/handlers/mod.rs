mod contacts;
mod health;
mod video;

pub use contacts::{create_contact, list_contacts};
pub use health::health;
pub use video::{get_analysis, list_user_analyses, upload_video};
