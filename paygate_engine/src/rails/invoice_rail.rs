use crate::{
    db_types::{OrderStatusType, PaymentType},
    rails::quote_from_rates,
    traits::{ExchangeRates, InvoiceClient, InvoiceRequest, PaymentLink, PaymentRail, PaymentRequest, Quote, RailError},
};

#[derive(Debug, Clone)]
pub struct InvoiceRail<I, X> {
    invoices: I,
    rates: X,
    currency: String,
}

impl<I, X> InvoiceRail<I, X> {
    pub fn new(invoices: I, rates: X, currency: &str) -> Self {
        Self { invoices, rates, currency: currency.to_string() }
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }
}

impl<I, X> PaymentRail for InvoiceRail<I, X>
where
    I: InvoiceClient,
    X: ExchangeRates,
{
    fn payment_type(&self) -> PaymentType {
        PaymentType::PlatformCredit
    }

    fn initial_status(&self) -> OrderStatusType {
        OrderStatusType::Processing
    }

    async fn quote(&self, fiat_cents: i64) -> Result<Quote, RailError> {
        quote_from_rates(&self.rates, &self.currency, fiat_cents).await
    }

    async fn request_payment(&self, request: PaymentRequest) -> Result<PaymentLink, RailError> {
        let invoice = InvoiceRequest {
            amount: request.amount,
            title: request.title,
            description: request.description,
            payload: request.correlation_key.clone(),
        };
        let link = self.invoices.create_invoice(invoice).await?;
        Ok(PaymentLink { link, correlation_key: request.correlation_key })
    }
}
