pub mod content;
pub mod crm;
pub mod procurement;
pub mod record;
pub mod sales;
pub mod warehouse;

pub use content::{ContentItem, ContentItemPatch, NewContentItem};
pub use crm::{
    Customer, CustomerPatch, Lead, LeadPatch, NewCustomer, NewLead, NewOffer, NewPartner, Offer,
    Partner, PartnerKind, PartnerPatch,
};
pub use procurement::{NewPurchaseOrder, PurchaseOrder, PurchaseOrderPatch};
pub use record::Record;
pub use sales::{
    NewOrder, NewServiceOrder, NewShippingOrder, NewWorkOrder, Order, OrderPatch, OrderType,
    ServiceOrder, ServiceOrderPatch, ShippingOrder, ShippingOrderPatch, WorkOrder, WorkOrderPatch,
};
pub use warehouse::{
    Movement, MovementDirection, NewMovement, NewRma, NewSerial, Rma, RmaPatch, Serial,
    SerialPatch,
};
