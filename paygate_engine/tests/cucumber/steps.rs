use chrono::{Duration, Utc};
use cucumber::{then, when};
use paygate_engine::{
    db_types::{OrderStatusType, PaymentType},
    traits::AccountManagement,
    LedgerReconciler,
    ReconciliationConfig,
};

use crate::{
    cucumber::OrderWorld,
    support::{MockNotifier, SERVICE_ADDRESS},
};

#[when(expr = "user {int} orders {int} of {string} with platform credit as {string}")]
async fn order_with_credit(world: &mut OrderWorld, user_id: i64, quantity: i64, product: String, alias: String) {
    let sys = world.system();
    let product_id = sys.product_id(&product);
    let order = sys.api.create_order(&sys.invoice_rail, user_id, product_id, quantity).await.expect("Error creating order");
    sys.orders.insert(alias, order);
}

#[when(expr = "user {int} orders {int} of {string} on-chain as {string}")]
async fn order_on_chain(world: &mut OrderWorld, user_id: i64, quantity: i64, product: String, alias: String) {
    let sys = world.system();
    let product_id = sys.product_id(&product);
    let order =
        sys.api.create_order(&sys.transfer_rail, user_id, product_id, quantity).await.expect("Error creating order");
    sys.orders.insert(alias, order);
}

#[when(expr = "user {int} orders {int} of {string} on-chain {int} times")]
async fn order_many(world: &mut OrderWorld, user_id: i64, quantity: i64, product: String, times: usize) {
    let sys = world.system();
    let product_id = sys.product_id(&product);
    for _ in 0..times {
        sys.api.create_order(&sys.transfer_rail, user_id, product_id, quantity).await.expect("Error creating order");
    }
}

#[when(expr = "user {int} tries to order {int} of {string} on-chain")]
async fn try_order(world: &mut OrderWorld, user_id: i64, quantity: i64, product: String) {
    let sys = world.system();
    let product_id = sys.product_id(&product);
    sys.last_error = sys.api.create_order(&sys.transfer_rail, user_id, product_id, quantity).await.err();
}

#[when(expr = "the user confirms the transfer for order {string}")]
async fn confirm_transfer(world: &mut OrderWorld, alias: String) {
    let sys = world.system();
    let id = sys.order(&alias).id;
    sys.api.update_status(id, OrderStatusType::Processing, None).await.expect("Error moving order to processing");
}

#[when(expr = "the checkout callback arrives for order {string}")]
async fn checkout_callback(world: &mut OrderWorld, alias: String) {
    let sys = world.system();
    let order = sys.order(&alias).clone();
    let answer = sys.api.precheck_checkout(order.payment_type, &order.external_payment_id).await;
    sys.last_answer = Some(answer);
}

#[when(expr = "the ledger shows the exact payment for order {string}")]
async fn exact_payment(world: &mut OrderWorld, alias: String) {
    let sys = world.system();
    let order = sys.order(&alias).clone();
    sys.ledger.push(order.amount.value(), Some(order.external_payment_id.as_str()));
}

#[when(expr = "the ledger shows {int} percent of the payment for order {string}")]
async fn partial_payment(world: &mut OrderWorld, percent: i64, alias: String) {
    let sys = world.system();
    let order = sys.order(&alias).clone();
    sys.ledger.push(order.amount.value() * percent / 100, Some(order.external_payment_id.as_str()));
}

#[when("the ledger is reconciled")]
async fn reconcile(world: &mut OrderWorld) {
    let sys = world.system();
    let mut notifier = MockNotifier::new();
    notifier.expect_notify().returning(|_, _| Ok(()));
    let config = ReconciliationConfig::new(PaymentType::OnChainNative, vec![SERVICE_ADDRESS.to_string()], "TON");
    let reconciler = LedgerReconciler::new(sys.api.clone(), sys.ledger.clone(), notifier, config);
    reconciler.reconcile_since(Utc::now() - Duration::hours(1)).await.expect("Error reconciling ledger");
}

#[when(expr = "{int} hours pass")]
async fn time_passes(world: &mut OrderWorld, hours: i64) {
    let sys = world.system();
    sys.api.expire_orders(Utc::now() + Duration::hours(hours)).await.expect("Error expiring orders");
}

#[then(expr = "order {string} is {word}")]
async fn check_status(world: &mut OrderWorld, alias: String, status: String) {
    let expected = status.parse::<OrderStatusType>().expect("Not a valid order status");
    let sys = world.system();
    let id = sys.order(&alias).id;
    let order = sys.api.fetch_order(id).await.expect("Error fetching order");
    assert_eq!(order.status, expected, "Order {alias} has the wrong status");
}

#[then("the checkout is accepted")]
async fn checkout_accepted(world: &mut OrderWorld) {
    let answer = world.system().last_answer.take().expect("No checkout answer");
    assert!(answer.is_accepted(), "Checkout was refused: {answer:?}");
}

#[then("the checkout is refused")]
async fn checkout_refused(world: &mut OrderWorld) {
    let answer = world.system().last_answer.take().expect("No checkout answer");
    assert!(!answer.is_accepted(), "Checkout was accepted");
}

#[then(expr = "the order is refused with {word}")]
async fn order_refused(world: &mut OrderWorld, code: String) {
    let err = world.system().last_error.take().expect("The order was not refused");
    assert_eq!(err.code(), code);
}

#[then(expr = "user {int} has {int} coins")]
async fn check_coins(world: &mut OrderWorld, user_id: i64, coins: i64) {
    let user = world.api().db().fetch_user(user_id).await.expect("Error fetching user");
    let balance = user.map(|u| u.coin_balance).unwrap_or_default();
    assert_eq!(balance, coins, "User {user_id} has the wrong balance");
}

#[then(expr = "user {int} has premium for at least {int} days")]
async fn check_premium(world: &mut OrderWorld, user_id: i64, days: i64) {
    let user = world.api().db().fetch_user(user_id).await.expect("Error fetching user").expect("No such user");
    assert!(user.is_premium(Utc::now() + Duration::days(days)), "Premium ends too soon: {:?}", user.premium_until);
}

#[then(expr = "order {string} has {int} history entries")]
async fn check_history(world: &mut OrderWorld, alias: String, count: usize) {
    let sys = world.system();
    let id = sys.order(&alias).id;
    let history = sys.api.order_history(id).await.expect("Error fetching history");
    assert_eq!(history.len(), count);
}
