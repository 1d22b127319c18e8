mod contact;
mod phone;

pub use contact::*;
pub use phone::PhoneNumber;
