use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::ValueEnum;
use saga_command::{Command, CommandBinding, CommandComponent, CommandHandler};
use saga_core::{
    Payload, PayloadError, PayloadKey, SagaDefinition, SagaDefinitionError, SagaStep,
    StepCatalog, StepId,
};
use saga_orchestrator::{Orchestrator, SagaError};
use thiserror::Error;
use tokio::runtime::Runtime;
use tracing::info;

const QUANTITY: PayloadKey<u32> = PayloadKey::new("quantity");
const RESERVATION: PayloadKey<String> = PayloadKey::new("reservation");
const CHARGED_CENTS: PayloadKey<u64> = PayloadKey::new("charged-cents");

pub(crate) const UNIT_PRICE_CENTS: u64 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OrderStep {
    Reserve,
    Charge,
    Ship,
}

impl OrderStep {
    const ALL: [Self; 3] = [Self::Reserve, Self::Charge, Self::Ship];

    pub(crate) fn id(self) -> StepId {
        StepId::from_static(match self {
            Self::Reserve => "reserve",
            Self::Charge => "charge",
            Self::Ship => "ship",
        })
    }
}

impl fmt::Display for OrderStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id().as_str())
    }
}

#[derive(Debug, Error)]
pub(crate) enum OrderError {
    #[error("injected failure at step '{0}'")]
    Injected(OrderStep),

    #[error("order quantity must be positive")]
    EmptyOrder,

    #[error("payload property '{0}' is missing")]
    MissingProperty(String),

    #[error("payload property has the wrong type")]
    Payload(#[from] PayloadError),
}

/// Behaviour knobs for the order steps.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct StepOptions {
    pub(crate) fail_at: Option<OrderStep>,
    pub(crate) delay: Duration,
}

impl StepOptions {
    fn enter(self, step: OrderStep) -> Result<(), OrderError> {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        if self.fail_at == Some(step) {
            return Err(OrderError::Injected(step));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Receipt {
    pub(crate) quantity: u32,
    pub(crate) reservation: String,
    pub(crate) charged_cents: u64,
    pub(crate) tracking: String,
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  quantity:    {}", self.quantity)?;
        writeln!(f, "  reservation: {}", self.reservation)?;
        writeln!(
            f,
            "  charged:     ${}.{:02}",
            self.charged_cents / 100,
            self.charged_cents % 100
        )?;
        write!(f, "  tracking:    {}", self.tracking)
    }
}

fn required<'a, T: 'static>(
    payload: &'a Payload<Receipt>,
    key: &PayloadKey<T>,
) -> Result<&'a T, OrderError> {
    payload
        .get_property(key)?
        .ok_or_else(|| OrderError::MissingProperty(key.id().to_string()))
}

fn reserve_step(options: StepOptions) -> SagaStep<Receipt, OrderError> {
    SagaStep::new(
        "Reserve stock",
        move |payload: &mut Payload<Receipt>| -> Result<(), OrderError> {
            options.enter(OrderStep::Reserve)?;
            let quantity = *required(payload, &QUANTITY)?;
            if quantity == 0 {
                return Err(OrderError::EmptyOrder);
            }
            let reservation = format!("RSV-{quantity:04}");
            info!(%reservation, quantity, "reserved stock");
            payload.add_property(&RESERVATION, reservation);
            Ok(())
        },
    )
    .with_compensator(|payload: &mut Payload<Receipt>| -> Result<(), OrderError> {
        if let Some(reservation) = payload.remove_property(&RESERVATION)? {
            info!(%reservation, "released stock reservation");
        }
        Ok(())
    })
}

fn charge_step(options: StepOptions) -> SagaStep<Receipt, OrderError> {
    SagaStep::new(
        "Charge payment",
        move |payload: &mut Payload<Receipt>| -> Result<(), OrderError> {
            options.enter(OrderStep::Charge)?;
            let amount = u64::from(*required(payload, &QUANTITY)?) * UNIT_PRICE_CENTS;
            info!(amount_cents = amount, "charged payment");
            payload.add_property(&CHARGED_CENTS, amount);
            Ok(())
        },
    )
    .with_compensator(|payload: &mut Payload<Receipt>| -> Result<(), OrderError> {
        if let Some(amount) = payload.remove_property(&CHARGED_CENTS)? {
            info!(amount_cents = amount, "refunded payment");
        }
        Ok(())
    })
}

/// Shipping cannot be taken back once handed to the carrier, so it declares
/// no compensator.
fn ship_step(options: StepOptions) -> SagaStep<Receipt, OrderError> {
    SagaStep::new(
        "Ship order",
        move |payload: &mut Payload<Receipt>| -> Result<(), OrderError> {
            options.enter(OrderStep::Ship)?;
            let reservation = required(payload, &RESERVATION)?.clone();
            let receipt = Receipt {
                quantity: *required(payload, &QUANTITY)?,
                charged_cents: *required(payload, &CHARGED_CENTS)?,
                tracking: format!("TRK-{reservation}"),
                reservation,
            };
            info!(tracking = %receipt.tracking, "handed order to carrier");
            payload.set_result(receipt);
            Ok(())
        },
    )
}

pub(crate) fn order_steps(options: StepOptions) -> StepCatalog<Receipt, OrderError> {
    StepCatalog::new()
        .with_step(OrderStep::Reserve.id(), reserve_step(options))
        .with_step(OrderStep::Charge.id(), charge_step(options))
        .with_step(OrderStep::Ship.id(), ship_step(options))
}

pub(crate) struct PlaceOrder {
    pub(crate) quantity: u32,
}

impl Command for PlaceOrder {
    const KIND: &'static str = "order.place";
    type Output = PlacedOrder;
    type Error = PlaceOrderError;
}

#[derive(Debug)]
pub(crate) struct PlacedOrder {
    pub(crate) receipt: Receipt,
    pub(crate) audit: String,
}

#[derive(Debug, Error)]
pub(crate) enum PlaceOrderError {
    #[error("invalid order saga")]
    Definition(#[from] SagaDefinitionError),

    #[error("order saga did not complete")]
    Saga {
        audit: String,
        #[source]
        source: SagaError<OrderError>,
    },
}

/// Runs the order saga for each [`PlaceOrder`] command.
pub(crate) struct PlaceOrderHandler {
    orchestrator: Orchestrator,
    steps: Arc<StepCatalog<Receipt, OrderError>>,
    runtime: Runtime,
    timeout: Duration,
}

impl PlaceOrderHandler {
    pub(crate) fn new(
        orchestrator: Orchestrator,
        steps: StepCatalog<Receipt, OrderError>,
        runtime: Runtime,
        timeout: Duration,
    ) -> Self {
        Self {
            orchestrator,
            steps: Arc::new(steps),
            runtime,
            timeout,
        }
    }
}

impl CommandHandler<PlaceOrder> for PlaceOrderHandler {
    fn handle(&self, command: PlaceOrder) -> Result<PlacedOrder, PlaceOrderError> {
        let mut payload = Payload::new();
        payload.add_property(&QUANTITY, command.quantity);
        let saga = SagaDefinition::builder("place-order")
            .steps(OrderStep::ALL.map(OrderStep::id))
            .payload(payload)
            .build()?;
        let state = saga.state();

        let result = self.runtime.block_on(self.orchestrator.run(
            saga,
            Arc::clone(&self.steps),
            self.timeout,
        ));

        let audit = state.audit_log().summary();
        match result {
            Ok(receipt) => Ok(PlacedOrder { receipt, audit }),
            Err(source) => Err(PlaceOrderError::Saga { audit, source }),
        }
    }
}

impl CommandComponent for PlaceOrderHandler {
    fn command_binding(self: Arc<Self>) -> Option<CommandBinding> {
        Some(CommandBinding::of::<PlaceOrder, _>(self))
    }
}
