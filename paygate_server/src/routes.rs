//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Database and network calls must be awaited, never blocked on.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use paygate_engine::{
    db_types::{NewProduct, OrderStatusType, PaymentType},
    exchange_objects::ExchangeRate,
    traits::{AccountManagement, ExchangeRates, InvoiceClient},
    OrderFlowApi,
};
use rail_clients::data_objects::{PreCheckoutAnswer, Update};

use crate::{
    config::AccessConfig,
    data_objects::{JsonResponse, NewOrderRequest, SetRateRequest},
    errors::ServerError,
    payment_rails::{GatewayBackend, PaymentRails},
};

pub const WEBHOOK_SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";
pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Catalogue  ----------------------------------------------------
route!(products => Get "/products" impl GatewayBackend);
pub async fn products<B: GatewayBackend>(api: web::Data<OrderFlowApi<B>>) -> Result<HttpResponse, ServerError> {
    let products = api.db().fetch_products().await?;
    Ok(HttpResponse::Ok().json(products))
}

route!(rate => Get "/rates/{currency}" impl GatewayBackend);
pub async fn rate<B: GatewayBackend>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let currency = path.into_inner();
    let rate = api.db().fetch_last_rate(&currency).await?;
    Ok(HttpResponse::Ok().json(rate))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl GatewayBackend, InvoiceClient);
pub async fn create_order<B: GatewayBackend, I: InvoiceClient>(
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
    rails: web::Data<PaymentRails<B, I>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!(
        "💻️ POST new order for user {}: {} × product {} on {}",
        req.user_id, req.quantity, req.product_id, req.payment_type
    );
    let (user_id, product_id, quantity) = (req.user_id, req.product_id, req.quantity);
    let order = match req.payment_type {
        PaymentType::PlatformCredit => api.create_order(&rails.credit, user_id, product_id, quantity).await?,
        PaymentType::OnChainNative => api.create_order(&rails.native, user_id, product_id, quantity).await?,
        PaymentType::Stablecoin => {
            let rail = rails.stablecoin.as_ref().ok_or(ServerError::RailNotAvailable(req.payment_type))?;
            api.create_order(rail, user_id, product_id, quantity).await?
        },
    };
    Ok(HttpResponse::Created().json(order))
}

route!(order_by_id => Get "/orders/{id}" impl GatewayBackend);
pub async fn order_by_id<B: GatewayBackend>(
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    trace!("💻️ GET order {order_id}");
    let order = api.fetch_order(order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(order_history => Get "/orders/{id}/history" impl GatewayBackend);
pub async fn order_history<B: GatewayBackend>(
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    api.fetch_order(order_id).await?;
    let history = api.order_history(order_id).await?;
    Ok(HttpResponse::Ok().json(history))
}

route!(transfer_submitted => Post "/orders/{id}/submitted" impl GatewayBackend);
/// The user reports that they sent the on-chain transfer. The order waits in `Processing` for reconciliation.
pub async fn transfer_submitted<B: GatewayBackend>(
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let order = api.fetch_order(order_id).await?;
    if !order.payment_type.is_ledger_settled() {
        return Err(ServerError::InvalidRequestBody(format!(
            "Order {order_id} is paid with {}, which is settled at checkout",
            order.payment_type
        )));
    }
    let order = api.update_status(order_id, OrderStatusType::Processing, None).await?;
    info!("💻️ User {} submitted the transfer for order {order_id}", order.user_id);
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Webhooks  ----------------------------------------------------
route!(precheckout => Post "/webhook/precheckout" impl GatewayBackend);
/// Answers the bot API's pre-checkout callback in the webhook response body.
pub async fn precheckout<B: GatewayBackend>(
    req: HttpRequest,
    body: web::Json<Update>,
    access: web::Data<AccessConfig>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    check_header_secret(&req, WEBHOOK_SECRET_HEADER, access.webhook_secret.reveal())?;
    let update = body.into_inner();
    let Some(query) = update.pre_checkout_query else {
        trace!("💻️ Ignoring update {} without a pre-checkout query", update.update_id);
        return Ok(HttpResponse::Ok().json(JsonResponse::success("Ignored")));
    };
    info!(
        "💻️ Pre-checkout query {} from user {} for {} {}",
        query.id, query.from.id, query.total_amount, query.currency
    );
    let answer = api.precheck_checkout(PaymentType::PlatformCredit, &query.invoice_payload).await;
    Ok(HttpResponse::Ok().json(PreCheckoutAnswer::new(&query.id, &answer)))
}

//----------------------------------------------   Admin  ----------------------------------------------------
route!(upsert_product => Post "/admin/products" impl GatewayBackend);
pub async fn upsert_product<B: GatewayBackend>(
    req: HttpRequest,
    body: web::Json<NewProduct>,
    access: web::Data<AccessConfig>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    check_admin(&req, &access)?;
    let product = api.db().upsert_product(body.into_inner()).await?;
    info!("💻️ Product #{} ({}) saved", product.id, product.name);
    Ok(HttpResponse::Ok().json(product))
}

route!(set_rate => Post "/admin/rates" impl GatewayBackend);
pub async fn set_rate<B: GatewayBackend>(
    req: HttpRequest,
    body: web::Json<SetRateRequest>,
    access: web::Data<AccessConfig>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    check_admin(&req, &access)?;
    let body = body.into_inner();
    if !body.units_per_cent.is_finite() || body.units_per_cent <= 0.0 {
        return Err(ServerError::InvalidRequestBody(format!("{} is not a valid rate", body.units_per_cent)));
    }
    let rate = ExchangeRate::new(&body.currency, body.units_per_cent, None);
    api.db().set_exchange_rate(&rate).await?;
    info!("💻️ Exchange rate updated: {rate}");
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Exchange rate updated: {rate}"))))
}

fn check_admin(req: &HttpRequest, access: &AccessConfig) -> Result<(), ServerError> {
    if access.admin_token.is_empty() {
        return Err(ServerError::Unauthorized("The admin routes are disabled".into()));
    }
    check_header_secret(req, ADMIN_TOKEN_HEADER, access.admin_token.reveal())
}

/// Passes if `expected` is empty or the header carries exactly `expected`.
fn check_header_secret(req: &HttpRequest, header: &str, expected: &str) -> Result<(), ServerError> {
    if expected.is_empty() {
        return Ok(());
    }
    match req.headers().get(header).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        Some(_) => {
            warn!("💻️ Request to {} with an invalid {header}", req.path());
            Err(ServerError::Unauthorized(format!("Invalid {header}")))
        },
        None => Err(ServerError::Unauthorized(format!("Missing {header}"))),
    }
}
