mod category;

pub use category::{Category, CategoryChanges, MoveDirection, NewCategory, SiblingSwap};
