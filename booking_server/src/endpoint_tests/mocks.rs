use booking_engine::{
    db_types::{
        NewOrder,
        NewPackage,
        NewUser,
        Order,
        OrderId,
        OrderStatusType,
        OrderSummary,
        Package,
        PackageId,
        PackageUpdate,
        PaymentMetadata,
        Role,
        Schedule,
        StatusSnapshot,
        UserAccount,
        UserId,
    },
    order_lifecycle::{MerchantOrderId, OrderStatusUpdate},
    traits::{
        AccountManagement,
        AccountManagementError,
        BookingDatabase,
        BookingDatabaseError,
        CatalogError,
        CatalogManagement,
    },
    GatewayError,
    PaymentProvider,
    PaymentRequest,
    PaymentSession,
};
use chrono::NaiveDate;
use mockall::mock;

mock! {
    pub BookingStore {}
    impl BookingDatabase for BookingStore {
        fn url(&self) -> &str;
        async fn insert_booking(&self, order: NewOrder) -> Result<Order, BookingDatabaseError>;
        async fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, BookingDatabaseError>;
        async fn fetch_orders_for_user(&self, user_id: &UserId) -> Result<Vec<OrderSummary>, BookingDatabaseError>;
        async fn fetch_all_orders(&self) -> Result<Vec<OrderSummary>, BookingDatabaseError>;
        async fn is_date_booked(&self, date: NaiveDate) -> Result<bool, BookingDatabaseError>;
        async fn fetch_schedules(&self) -> Result<Vec<Schedule>, BookingDatabaseError>;
        async fn update_order_status(
            &self,
            id: &OrderId,
            expected: StatusSnapshot,
            update: &OrderStatusUpdate,
            metadata: &PaymentMetadata,
        ) -> Result<bool, BookingDatabaseError>;
        async fn set_order_status_if(
            &self,
            id: &OrderId,
            expected: OrderStatusType,
            status: OrderStatusType,
        ) -> Result<bool, BookingDatabaseError>;
        async fn record_transaction_id(
            &self,
            payment: &MerchantOrderId,
            transaction_id: &str,
        ) -> Result<bool, BookingDatabaseError>;
    }
    impl CatalogManagement for BookingStore {
        async fn fetch_packages(&self) -> Result<Vec<Package>, CatalogError>;
        async fn fetch_package(&self, id: &PackageId) -> Result<Option<Package>, CatalogError>;
        async fn insert_package(&self, package: NewPackage) -> Result<Package, CatalogError>;
        async fn update_package(&self, id: &PackageId, update: PackageUpdate) -> Result<Package, CatalogError>;
        async fn delete_package(&self, id: &PackageId) -> Result<(), CatalogError>;
    }
}

mock! {
    pub AccountStore {}
    impl AccountManagement for AccountStore {
        async fn insert_user(&self, user: NewUser) -> Result<UserAccount, AccountManagementError>;
        async fn fetch_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, AccountManagementError>;
        async fn fetch_user_by_id(&self, id: &UserId) -> Result<Option<UserAccount>, AccountManagementError>;
        async fn assign_role(&self, email: &str, role: Role) -> Result<bool, AccountManagementError>;
    }
}

mock! {
    pub Gateway {}
    impl PaymentProvider for Gateway {
        async fn create_transaction(&self, request: PaymentRequest) -> Result<PaymentSession, GatewayError>;
    }
}
