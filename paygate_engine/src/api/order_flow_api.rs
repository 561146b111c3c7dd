use std::{fmt::Debug, future::Future, pin::Pin, time::Duration};

use chrono::Utc;
use log::*;
use tokio::sync::mpsc;

use crate::{
    db_types::{NewLineItem, NewOrder, Order, OrderPatch, OrderStatusType, PaymentType, StatusHistoryEntry},
    events::{SuccessEvent, SuccessEventHub, Subscription},
    helpers::new_correlation_key,
    keyed_lock::{creation_lock_key, order_lock_key, KeyedLock},
    order_objects::{CheckoutAnswer, ExpiryResult},
    state_machine::{can_transition, is_closed_for_checkout, is_terminal},
    traits::{
        OrderManagement,
        PaymentGatewayError,
        PaymentRail,
        PaymentRequest,
        StatusTransition,
        Transfer,
        TransitionOutcome,
        Wallet,
        WalletClient,
    },
    OrderFlowError,
};

pub const EXPIRY_SWEEP_JOB: &str = "job:expiry-sweep";

#[derive(Debug, Clone)]
pub struct OrderFlowConfig {
    /// How long a new order stays payable
    pub order_expiry: chrono::Duration,
    /// The number of not-ended orders a user may have for a single product
    pub max_open_orders: i64,
    /// The largest quantity a single order may carry
    pub max_quantity: i64,
    /// Upper bound on how long one status transition may hold an order's lock
    pub lock_ttl: Duration,
    /// Upper bound on how long a periodic job may hold its single-flight lock
    pub job_lock_ttl: Duration,
    /// How long a quoted exchange rate remains valid
    pub rate_valid_seconds: i64,
    /// Buffer size for success event subscribers
    pub event_buffer_size: usize,
}

impl Default for OrderFlowConfig {
    fn default() -> Self {
        Self {
            order_expiry: chrono::Duration::hours(1),
            max_open_orders: 10,
            max_quantity: 100,
            lock_ttl: Duration::from_secs(30),
            job_lock_ttl: Duration::from_secs(600),
            rate_valid_seconds: 900,
            event_buffer_size: 32,
        }
    }
}

/// `OrderFlowApi` owns the order lifecycle: creating orders, moving them through the state machine, and telling
/// subscribers when an order has been paid.
///
/// All status changes go through [`Self::update_status`], which holds the order's lock for the whole
/// read-validate-write cycle. Clones share the same lock table and event hub.
#[derive(Clone)]
pub struct OrderFlowApi<B> {
    db: B,
    locks: KeyedLock,
    success_hub: SuccessEventHub,
    config: OrderFlowConfig,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, config: OrderFlowConfig) -> Self {
        Self { db, locks: KeyedLock::new(), success_hub: SuccessEventHub::new(), config }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn locks(&self) -> &KeyedLock {
        &self.locks
    }

    pub fn config(&self) -> &OrderFlowConfig {
        &self.config
    }

    /// Runs `f` for every order that reaches `Success`. Events arrive after the order and the user's entitlement have
    /// been committed. Filtering is up to the callback.
    pub fn on_success<F>(&self, f: F) -> Subscription
    where F: (Fn(SuccessEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.success_hub.on_success(self.config.event_buffer_size, f)
    }

    /// Channel flavour of [`Self::on_success`].
    pub fn subscribe_success(&self) -> (Subscription, mpsc::Receiver<SuccessEvent>) {
        self.success_hub.subscribe(self.config.event_buffer_size)
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement
{
    /// Refuses a new order if the user already has `max_open_orders` not-ended orders for the product.
    pub async fn pre_check_creation(&self, user_id: i64, product_id: i64) -> Result<(), OrderFlowError> {
        let count = self.db.count_open_line_items(user_id, product_id).await?;
        if count >= self.config.max_open_orders {
            debug!("🔄️ User {user_id} has {count} open orders for product {product_id}. Refusing another.");
            return Err(OrderFlowError::OrderMaxCountReached { user_id, product_id, count });
        }
        Ok(())
    }

    /// Creates an order for `quantity` units of a product, payable on `rail`.
    ///
    /// The order is stored as `Pending` along with its line item. Rails whose payment link is itself a live payment
    /// attempt move it to `Processing` straight away.
    pub async fn create_order<R: PaymentRail>(
        &self,
        rail: &R,
        user_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> Result<Order, OrderFlowError> {
        if quantity < 1 || quantity > self.config.max_quantity {
            return Err(OrderFlowError::InvalidQuantity(quantity));
        }
        let key = creation_lock_key(user_id, product_id);
        let creation = self.insert_new_order(rail, user_id, product_id, quantity);
        let order = self.locks.with_lock(&key, self.config.lock_ttl, creation).await?;
        match rail.initial_status() {
            OrderStatusType::Pending => Ok(order),
            status => self.update_status(order.id, status, None).await,
        }
    }

    /// Checks the open order cap, prices the order, requests the payment link and stores the order. Runs under the
    /// user's creation lock for the product, so the cap holds for concurrent requests.
    async fn insert_new_order<R: PaymentRail>(
        &self,
        rail: &R,
        user_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> Result<Order, OrderFlowError> {
        let product = self.db.fetch_product(product_id).await?.ok_or(OrderFlowError::ProductNotFound(product_id))?;
        self.pre_check_creation(user_id, product_id).await?;
        let fiat_amount = product.price_cents.checked_mul(quantity).ok_or(OrderFlowError::InvalidQuantity(quantity))?;
        let quote = rail.quote(fiat_amount).await?;
        let request = PaymentRequest {
            amount: quote.amount,
            title: product.name.clone(),
            description: format!("{quantity} × {}", product.name),
            correlation_key: new_correlation_key(),
        };
        let link = rail.request_payment(request).await?;
        self.db.fetch_or_create_user(user_id).await?;
        let now = Utc::now();
        let order = NewOrder {
            user_id,
            payment_type: rail.payment_type(),
            amount: quote.amount,
            fiat_amount,
            exchange_rate: quote.rate,
            rate_valid_seconds: self.config.rate_valid_seconds,
            rate_quoted_at: quote.quoted_at,
            external_payment_id: link.correlation_key,
            payment_link: link.link,
            expire_at: now + self.config.order_expiry,
            created_at: now,
        };
        let (order, _) = self.db.insert_order(order, NewLineItem { product_id, quantity }).await?;
        info!(
            "🔄️ Order {} created for user {user_id}: {quantity} × product {product_id} on {} for {}",
            order.id, order.payment_type, order.amount
        );
        Ok(order)
    }

    /// Moves an order to `to`.
    ///
    /// The order is loaded and validated while holding its lock, so concurrent calls for the same order are applied
    /// one after the other and each sees the result of the previous one. A `Success` event is published after the
    /// transition has been committed.
    pub async fn update_status(
        &self,
        order_id: i64,
        to: OrderStatusType,
        patch: Option<OrderPatch>,
    ) -> Result<Order, OrderFlowError> {
        let key = order_lock_key(order_id);
        let transition = self.transition_locked(order_id, to, patch.unwrap_or_default());
        let outcome = self.locks.with_lock(&key, self.config.lock_ttl, transition).await?;
        if let Some(fulfilment) = outcome.fulfilment {
            let event = SuccessEvent::new(outcome.order.clone(), fulfilment.product);
            self.success_hub.publish(event);
        }
        Ok(outcome.order)
    }

    async fn transition_locked(
        &self,
        order_id: i64,
        to: OrderStatusType,
        patch: OrderPatch,
    ) -> Result<TransitionOutcome, OrderFlowError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        let from = order.status;
        if is_terminal(from) {
            debug!("🔄️ Order {order_id} is already {from}. Ignoring the move to {to}");
            return Err(OrderFlowError::OrderAlreadyResolved { order_id, status: from });
        }
        if !can_transition(from, to) {
            warn!("🔄️ Order {order_id} cannot move from {from} to {to}");
            return Err(OrderFlowError::OrderStatusInvalid { order_id, from, to });
        }
        let now = Utc::now();
        if to == OrderStatusType::Success && order.rate_is_stale(now) {
            warn!(
                "🔄️ Order {order_id} is being completed with an exchange rate quoted at {}, which is older than {}s. \
                 Accepting it anyway.",
                order.rate_quoted_at, order.rate_valid_seconds
            );
        }
        let transition = StatusTransition::new(order_id, from, to, patch.clone(), now);
        let outcome = match self.db.transition_order(transition).await {
            Err(PaymentGatewayError::Fulfilment(source)) => {
                error!("🔄️ Order {order_id} was paid but cannot be fulfilled. {source}. Marking it as failed.");
                let patch = OrderPatch { paid_at: None, ..patch };
                let failed = StatusTransition::new(order_id, from, OrderStatusType::Failed, patch, now);
                self.db.transition_order(failed).await?;
                return Err(OrderFlowError::Fulfilment { order_id, source });
            },
            result => result?,
        };
        info!("🔄️ Order {order_id}: {from} -> {to}");
        if let Some(f) = &outcome.fulfilment {
            debug!(
                "🔄️ Order {order_id} fulfilled for user {}: {} coins, premium until {:?}",
                f.grant.user_id, f.grant.coins, f.grant.premium_until
            );
        }
        Ok(outcome)
    }

    /// Answers a platform pre-checkout callback for the invoice with payload `key`.
    ///
    /// Only accepts once the order and the entitlement have been committed. Unknown keys and closed orders (including
    /// `Failed` ones) are refused without touching the database.
    pub async fn precheck_checkout(&self, payment_type: PaymentType, key: &str) -> CheckoutAnswer {
        let order = match self.db.fetch_order_by_payment_id(payment_type, key).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                warn!("🔄️ Checkout for unknown {payment_type} payment id {key}");
                return CheckoutAnswer::reject("We could not find this order. Please start a new purchase.");
            },
            Err(e) => {
                error!("🔄️ Could not look up checkout for payment id {key}. {e}");
                return CheckoutAnswer::reject("Something went wrong on our side. Please try again shortly.");
            },
        };
        if is_closed_for_checkout(order.status) {
            debug!("🔄️ Checkout for order {} refused. It is already {}", order.id, order.status);
            return CheckoutAnswer::reject(format!("This order is already {}.", order.status.to_string().to_lowercase()));
        }
        match self.update_status(order.id, OrderStatusType::Success, None).await {
            Ok(order) => CheckoutAnswer::Accept { order_id: order.id },
            Err(e) => {
                warn!("🔄️ Checkout for order {} refused. {e}", order.id);
                CheckoutAnswer::reject(format!("This order can no longer be paid. {e}"))
            },
        }
    }

    /// Pays an order from the wallet connected to `session_id`.
    ///
    /// The order moves to `Processing` first. If the wallet cannot be reached or the transfer is rejected, the order
    /// is marked `Failed` and the transfer error is returned.
    pub async fn submit_transfer<W: WalletClient>(
        &self,
        wallets: &W,
        session_id: &str,
        order_id: i64,
        to_address: &str,
    ) -> Result<Order, OrderFlowError> {
        let order = self.update_status(order_id, OrderStatusType::Processing, None).await?;
        let transfer =
            Transfer { to: to_address.to_string(), amount: order.amount, comment: order.external_payment_id.clone() };
        let sent = match wallets.create_or_reuse_wallet(session_id).await {
            Ok(wallet) => wallet.send_transfer(transfer).await,
            Err(e) => Err(e),
        };
        match sent {
            Ok(()) => {
                info!("🔄️ Transfer for order {order_id} sent. Waiting for it to appear on the ledger.");
                Ok(order)
            },
            Err(e) => {
                warn!("🔄️ Transfer for order {order_id} failed. {e}");
                if let Err(fail_err) = self.update_status(order_id, OrderStatusType::Failed, None).await {
                    error!("🔄️ Could not mark order {order_id} as failed after a failed transfer. {fail_err}");
                }
                Err(OrderFlowError::Transfer(e))
            },
        }
    }

    /// Expires every order that is past its deadline and not yet `Success` or `Expired`.
    ///
    /// Each order goes through [`Self::update_status`]. Failures are logged and skipped.
    pub async fn expire_orders(&self, now: chrono::DateTime<Utc>) -> Result<ExpiryResult, OrderFlowError> {
        let candidates = self.db.fetch_expired_candidates(now).await?;
        trace!("🕰️ {} orders are past their expiry time", candidates.len());
        let mut result = ExpiryResult::default();
        for order in candidates {
            match self.update_status(order.id, OrderStatusType::Expired, None).await {
                Ok(order) => result.expired.push(order),
                Err(e) => {
                    warn!("🕰️ Could not expire order {}. {e}", order.id);
                    result.skipped.push((order.id, e.to_string()));
                },
            }
        }
        Ok(result)
    }

    /// [`Self::expire_orders`], guarded so that two sweeps never run at the same time. The cutoff is taken once the
    /// sweep holds the job lock.
    pub async fn run_expiry_sweep(&self) -> Result<ExpiryResult, OrderFlowError> {
        let sweep = async { self.expire_orders(Utc::now()).await };
        self.locks.with_lock(EXPIRY_SWEEP_JOB, self.config.job_lock_ttl, sweep).await
    }

    pub async fn fetch_order(&self, order_id: i64) -> Result<Order, OrderFlowError> {
        self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))
    }

    pub async fn fetch_order_by_payment_id(
        &self,
        payment_type: PaymentType,
        key: &str,
    ) -> Result<Option<Order>, OrderFlowError> {
        Ok(self.db.fetch_order_by_payment_id(payment_type, key).await?)
    }

    pub async fn order_history(&self, order_id: i64) -> Result<Vec<StatusHistoryEntry>, OrderFlowError> {
        Ok(self.db.fetch_status_history(order_id).await?)
    }
}
