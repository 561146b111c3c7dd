use std::time::Duration;

use actix_web::{
    dev::Server,
    http::KeepAlive,
    middleware::Logger,
    web,
    web::ServiceConfig,
    App,
    HttpServer,
};
use log::*;
use paygate_engine::{
    db_types::PaymentType,
    events::Subscription,
    traits::InvoiceClient,
    LedgerReconciler,
    OrderFlowApi,
    ReconciliationConfig,
    SqliteDatabase,
};
use rail_clients::{BotApi, LedgerApi, LedgerSource};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    ledger_worker::{start_ledger_worker, ServerReconciler},
    payment_rails::PaymentRails,
    routes::{
        health,
        CreateOrderRoute,
        OrderByIdRoute,
        OrderHistoryRoute,
        PrecheckoutRoute,
        ProductsRoute,
        RateRoute,
        SetRateRoute,
        TransferSubmittedRoute,
        UpsertProductRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let api = OrderFlowApi::new(db, config.order_flow.clone());
    let bot = BotApi::new(config.bot_api.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let reconcilers = build_reconcilers(&config, &api, &bot)?;
    let _success_log = log_successful_orders(&api);
    let _expiry_worker =
        start_expiry_worker(api.clone(), config.jobs.expiry_interval, !config.jobs.skip_startup_jobs);
    let _ledger_worker = start_ledger_worker(reconcilers, config.jobs.clone());
    let srv = create_server_instance(config, api, bot)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// One reconciler per ledger-settled rail. They share the order flow, and so the order locks, with the HTTP workers.
pub fn build_reconcilers(
    config: &ServerConfig,
    api: &OrderFlowApi<SqliteDatabase>,
    bot: &BotApi,
) -> Result<Vec<ServerReconciler>, ServerError> {
    let addresses = vec![config.rails.receiving_address.clone()];
    let page_size = config.jobs.ledger_page_size;
    let native_ledger = LedgerApi::new(config.ledger_api.clone(), LedgerSource::Native)
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let native_config = ReconciliationConfig::new(PaymentType::OnChainNative, addresses.clone(), &config.rails.native_code)
        .with_page_size(page_size);
    let mut reconcilers = vec![LedgerReconciler::new(api.clone(), native_ledger, bot.clone(), native_config)];
    if let Some(master) = &config.rails.stablecoin_master {
        let source = LedgerSource::Jetton { master: master.clone() };
        let ledger = LedgerApi::new(config.ledger_api.clone(), source)
            .map_err(|e| ServerError::InitializeError(e.to_string()))?;
        let token_config = ReconciliationConfig::new(PaymentType::Stablecoin, addresses, &config.rails.stablecoin_code)
            .with_page_size(page_size);
        reconcilers.push(LedgerReconciler::new(api.clone(), ledger, bot.clone(), token_config));
    }
    Ok(reconcilers)
}

fn log_successful_orders(api: &OrderFlowApi<SqliteDatabase>) -> Subscription {
    api.on_success(|event| {
        Box::pin(async move {
            info!(
                "🎉️ Order {} complete: user {} bought {} on {}",
                event.order.id, event.order.user_id, event.product.name, event.order.payment_type
            );
        })
    })
}

pub fn create_server_instance<I>(
    config: ServerConfig,
    api: OrderFlowApi<SqliteDatabase>,
    invoices: I,
) -> Result<Server, ServerError>
where
    I: InvoiceClient + Clone + Send + 'static,
{
    let rail_config = config.rails.clone();
    let access = config.access.clone();
    let srv = HttpServer::new(move || {
        let rails = PaymentRails::new(api.db().clone(), invoices.clone(), &rail_config);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("paygate::access_log"))
            .app_data(web::Data::new(api.clone()))
            .app_data(web::Data::new(rails))
            .app_data(web::Data::new(access.clone()))
            .configure(configure_routes::<I>)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers every route. The order flow, the payment rails and the access configuration must be added as app data.
pub fn configure_routes<I: InvoiceClient + 'static>(cfg: &mut ServiceConfig) {
    let json_config = web::JsonConfig::default()
        .error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into());
    cfg.app_data(json_config)
        .service(health)
        .service(ProductsRoute::<SqliteDatabase>::new())
        .service(RateRoute::<SqliteDatabase>::new())
        .service(CreateOrderRoute::<SqliteDatabase, I>::new())
        .service(OrderByIdRoute::<SqliteDatabase>::new())
        .service(OrderHistoryRoute::<SqliteDatabase>::new())
        .service(TransferSubmittedRoute::<SqliteDatabase>::new())
        .service(PrecheckoutRoute::<SqliteDatabase>::new())
        .service(UpsertProductRoute::<SqliteDatabase>::new())
        .service(SetRateRoute::<SqliteDatabase>::new());
}
