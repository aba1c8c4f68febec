mod category;

pub use category::{Category, CategoryInput, CategoryListRow, CategoryStatus};
