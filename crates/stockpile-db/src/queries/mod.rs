pub mod access;
pub mod comments;
pub mod fields;
pub mod inventories;
pub mod items;
pub mod likes;
pub mod users;
