pub mod media_saver;

pub use media_saver::{suggested_filename, MediaSaver, SaveEvent};
