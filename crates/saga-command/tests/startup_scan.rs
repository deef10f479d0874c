use std::sync::Arc;
use std::thread;

use saga_command::{
    Command, CommandBinding, CommandComponent, CommandHandler, CommandRegistry, DispatchError,
    DuplicatePolicy, RegistryError,
};

#[derive(Debug, PartialEq, thiserror::Error)]
#[error("order {0} is unknown")]
struct UnknownOrder(u64);

struct PlaceOrder {
    quantity: u32,
}

impl Command for PlaceOrder {
    const KIND: &'static str = "order.place";
    type Output = u64;
    type Error = std::convert::Infallible;
}

struct CancelOrder {
    order_id: u64,
}

impl Command for CancelOrder {
    const KIND: &'static str = "order.cancel";
    type Output = ();
    type Error = UnknownOrder;
}

struct ShipOrder;

impl Command for ShipOrder {
    const KIND: &'static str = "order.ship";
    type Output = ();
    type Error = std::convert::Infallible;
}

struct PlaceOrderHandler {
    base_id: u64,
}

impl CommandHandler<PlaceOrder> for PlaceOrderHandler {
    fn handle(&self, command: PlaceOrder) -> Result<u64, std::convert::Infallible> {
        Ok(self.base_id + u64::from(command.quantity))
    }
}

impl CommandComponent for PlaceOrderHandler {
    fn command_binding(self: Arc<Self>) -> Option<CommandBinding> {
        Some(CommandBinding::of::<PlaceOrder, _>(self))
    }
}

struct CancelOrderHandler;

impl CommandHandler<CancelOrder> for CancelOrderHandler {
    fn handle(&self, command: CancelOrder) -> Result<(), UnknownOrder> {
        Err(UnknownOrder(command.order_id))
    }
}

impl CommandComponent for CancelOrderHandler {
    fn command_binding(self: Arc<Self>) -> Option<CommandBinding> {
        Some(CommandBinding::of::<CancelOrder, _>(self))
    }
}

/// A component that handles no command.
struct InventoryCache;

impl CommandComponent for InventoryCache {}

fn components() -> Vec<Arc<dyn CommandComponent>> {
    vec![
        Arc::new(PlaceOrderHandler { base_id: 1000 }),
        Arc::new(InventoryCache),
        Arc::new(CancelOrderHandler),
    ]
}

#[test]
fn scan_registers_only_components_declaring_a_kind() -> anyhow::Result<()> {
    let mut builder = CommandRegistry::builder();

    let registered = builder.scan(components())?;
    let registry = builder.build();

    assert_eq!(registered, 2);
    assert_eq!(
        registry.kinds().map(|kind| kind.as_str()).collect::<Vec<_>>(),
        ["order.place", "order.cancel"]
    );
    assert!(registry.get::<PlaceOrder>().is_some());
    assert!(registry.get::<CancelOrder>().is_some());
    assert!(registry.get::<ShipOrder>().is_none());
    Ok(())
}

#[test]
fn unregistered_kinds_are_absent_not_errors() -> anyhow::Result<()> {
    let mut builder = CommandRegistry::builder();
    builder.scan(components())?;
    let registry = builder.build();

    assert!(registry.get_by_kind("order.ship").is_none());
    assert!(registry.get_by_kind("").is_none());
    assert!(registry.get::<ShipOrder>().is_none());
    assert!(matches!(
        registry.dispatch(ShipOrder),
        Err(DispatchError::HandlerNotFound { kind }) if kind.as_str() == "order.ship"
    ));
    Ok(())
}

#[test]
fn binding_lookup_by_kind_reports_handler_type() -> anyhow::Result<()> {
    let mut builder = CommandRegistry::builder();
    builder.scan(components())?;
    let registry = builder.build();

    let binding = registry.get_by_kind("order.cancel").expect("scanned");

    assert!(binding.handler_type().ends_with("CancelOrderHandler"));
    assert!(binding.command_type().ends_with("CancelOrder"));
    Ok(())
}

#[test]
fn dispatch_returns_handler_error_unchanged() -> anyhow::Result<()> {
    let mut builder = CommandRegistry::builder();
    builder.scan(components())?;
    let registry = builder.build();

    let err = registry
        .dispatch(CancelOrder { order_id: 7 })
        .expect_err("handler refuses");

    assert_eq!(err.kind().as_str(), "order.cancel");
    assert_eq!(err.into_handler_error(), Some(UnknownOrder(7)));
    Ok(())
}

#[test]
fn later_component_wins_duplicate_kind_during_scan() -> anyhow::Result<()> {
    let scanned: Vec<Arc<dyn CommandComponent>> = vec![
        Arc::new(PlaceOrderHandler { base_id: 1000 }),
        Arc::new(PlaceOrderHandler { base_id: 2000 }),
    ];
    let mut builder = CommandRegistry::builder();

    let registered = builder.scan(scanned)?;
    let registry = builder.build();

    assert_eq!(registered, 2);
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.dispatch(PlaceOrder { quantity: 5 })?, 2005);
    Ok(())
}

#[test]
fn strict_scan_stops_at_duplicate_kind() {
    let scanned: Vec<Arc<dyn CommandComponent>> = vec![
        Arc::new(PlaceOrderHandler { base_id: 1000 }),
        Arc::new(PlaceOrderHandler { base_id: 2000 }),
        Arc::new(CancelOrderHandler),
    ];
    let mut builder = CommandRegistry::builder().with_duplicate_policy(DuplicatePolicy::Reject);

    let result = builder.scan(scanned);

    assert!(matches!(
        result,
        Err(RegistryError::DuplicateKind { kind, .. }) if kind.as_str() == "order.place"
    ));
    let registry = builder.build();
    assert!(registry.contains("order.place"));
    assert!(!registry.contains("order.cancel"));
}

#[test]
fn registry_is_read_concurrently() -> anyhow::Result<()> {
    let mut builder = CommandRegistry::builder();
    builder.scan(components())?;
    let registry = Arc::new(builder.build());

    let readers: Vec<_> = (0..8u32)
        .map(|quantity| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.dispatch(PlaceOrder { quantity }))
        })
        .collect();

    let mut ids = Vec::new();
    for reader in readers {
        let id = reader.join().expect("reader thread")?;
        ids.push(id);
    }
    ids.sort_unstable();

    assert_eq!(ids, (1000..1008).collect::<Vec<u64>>());
    Ok(())
}
