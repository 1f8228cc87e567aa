mod cart;
mod mapping;
mod order;
mod order_descriptor;
mod payment_method;
mod shipping;

pub use cart::{CartLine, CartSnapshot, CartTotals};
pub use mapping::OrderMapping;
pub use order::{CreateOrder, LocalOrder, OrderNote, OrderStatus};
pub use order_descriptor::OrderDescriptor;
pub use payment_method::{PaymentMethod, PaymentMethodKind};
pub use shipping::{DeliveryMethod, ShippingAddress, ShippingRate};
