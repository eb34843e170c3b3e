//! Catalog entity models
//!
//! Each entity ships with Create/Update payload structs so callers never
//! build partial rows by hand. Ids are assigned by the datastore.

mod banner;
mod category;
mod order;
mod payment_condition;
mod product;
mod seller;
mod setting;

pub use banner::{Banner, BannerCreate, BannerUpdate};
pub use category::{Category, CategoryCreate, CategoryUpdate};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatus, OrderUpdate};
pub use payment_condition::{PaymentCondition, PaymentConditionCreate, PaymentConditionUpdate};
pub use product::{
    PLACEHOLDER_IMAGE, Product, ProductCreate, ProductUpdate, ProductUpsertRow, slugify,
};
pub use seller::{Seller, SellerCreate, SellerUpdate};
pub use setting::StoreSetting;
