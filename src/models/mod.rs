pub mod analytics;
pub mod demand;
pub mod order;
pub mod product;
pub mod special_request;
pub mod supply;
pub mod user;

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

pub use analytics::{AdminStats, SupplierStats, VendorStats};
pub use demand::{DailyDemand, DailyDemandWithProduct, DemandQuery};
pub use order::{
    Order, OrderDetail, OrderItem, OrderItemDetail, OrderStatus, PlaceOrderRequest,
    UpdateOrderStatus,
};
pub use product::{CreateProduct, Product, UpdateProduct};
pub use special_request::{
    CreateSpecialRequest, DecideResponse, RespondToRequest, ResponseDetail, ResponseStatus,
    SpecialRequest, SpecialRequestDetail, SpecialRequestResponse, SpecialRequestRow,
    SpecialRequestStatus,
};
pub use supply::{
    CreateSupplyOffer, SupplyOffer, SupplyOfferDetail, SupplyOfferStatus, UpdateSupplyOfferStatus,
};
pub use user::{
    AuthResponse, LoginRequest, RegisterRequest, UpdateUserStatus, User, UserResponse, UserRole,
};

/// Short user reference embedded in order and request listings.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}
