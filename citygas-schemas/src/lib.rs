pub mod draft;
pub mod file_formats;
pub mod inventory;
pub mod methodology;
pub mod reference;
pub mod taxonomy;
