use crate::{
    db_types::{OrderStatusType, PaymentType},
    rails::quote_from_rates,
    traits::{ExchangeRates, PaymentLink, PaymentRail, PaymentRequest, Quote, RailError},
};

#[derive(Debug, Clone)]
pub struct TransferRail<X> {
    payment_type: PaymentType,
    rates: X,
    currency: String,
    receiving_address: String,
    /// The token contract, for rails that settle in a token rather than the chain's native coin
    token_contract: Option<String>,
    scheme: String,
}

impl<X> TransferRail<X> {
    /// A rail for the chain's native coin.
    pub fn native(rates: X, currency: &str, receiving_address: &str) -> Self {
        Self {
            payment_type: PaymentType::OnChainNative,
            rates,
            currency: currency.to_string(),
            receiving_address: receiving_address.to_string(),
            token_contract: None,
            scheme: "ton".to_string(),
        }
    }

    /// A rail for a token transfer, e.g. a stablecoin.
    pub fn token(rates: X, currency: &str, receiving_address: &str, token_contract: &str) -> Self {
        Self {
            payment_type: PaymentType::Stablecoin,
            token_contract: Some(token_contract.to_string()),
            ..Self::native(rates, currency, receiving_address)
        }
    }

    pub fn with_scheme(mut self, scheme: &str) -> Self {
        self.scheme = scheme.to_string();
        self
    }

    pub fn receiving_address(&self) -> &str {
        &self.receiving_address
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// The wallet deep link for a transfer of `request.amount` carrying the correlation key as its comment.
    pub fn transfer_link(&self, request: &PaymentRequest) -> String {
        let token = self.token_contract.as_ref().map(|c| format!("&jetton={c}")).unwrap_or_default();
        format!(
            "{}://transfer/{}?amount={}{token}&text={}",
            self.scheme, self.receiving_address, request.amount, request.correlation_key
        )
    }
}

impl<X> PaymentRail for TransferRail<X>
where X: ExchangeRates
{
    fn payment_type(&self) -> PaymentType {
        self.payment_type
    }

    fn initial_status(&self) -> OrderStatusType {
        OrderStatusType::Pending
    }

    async fn quote(&self, fiat_cents: i64) -> Result<Quote, RailError> {
        quote_from_rates(&self.rates, &self.currency, fiat_cents).await
    }

    async fn request_payment(&self, request: PaymentRequest) -> Result<PaymentLink, RailError> {
        let link = self.transfer_link(&request);
        Ok(PaymentLink { link, correlation_key: request.correlation_key })
    }
}
