//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod category;
pub mod client;
pub mod ingredient;
pub mod invoice;
pub mod invoice_line;
pub mod invoice_sequence;
pub mod order;
pub mod order_line;
pub mod order_status;
pub mod product;
pub mod recipe;
pub mod session;
pub mod user;

// Re-export specific types to avoid conflicts
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use client::{Column as ClientColumn, Entity as Client, Model as ClientModel};
pub use ingredient::{Column as IngredientColumn, Entity as Ingredient, Model as IngredientModel};
pub use invoice::{
    Column as InvoiceColumn, Entity as Invoice, InvoiceState, Model as InvoiceModel,
};
pub use invoice_line::{
    Column as InvoiceLineColumn, Entity as InvoiceLine, Model as InvoiceLineModel,
};
pub use invoice_sequence::{
    Column as InvoiceSequenceColumn, Entity as InvoiceSequence, Model as InvoiceSequenceModel,
};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel};
pub use order_line::{Column as OrderLineColumn, Entity as OrderLine, Model as OrderLineModel};
pub use order_status::{
    Column as OrderStatusColumn, Entity as OrderStatus, Model as OrderStatusModel, StatusKind,
};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use recipe::{Column as RecipeColumn, Entity as Recipe, Model as RecipeModel};
pub use session::{Column as SessionColumn, Entity as Session, Model as SessionModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel, Role};
