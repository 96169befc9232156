use serde::Serialize;
use tera::{Context, Tera};

const PAYMENT_TEMPLATE: &str = "payment.html";

/// Values available to the payment page template.
#[derive(Debug, Serialize)]
pub struct PaymentView<'a> {
    pub publishable_key: &'a str,
    pub action: &'a str,
    pub namespace: &'a str,
    pub currency: &'a str,
    /// Minor units, only when the shop has an order for this request
    pub amount: Option<i64>,
    pub summary: Option<&'a str>,
    pub email: Option<&'a str>,
    pub error: Option<&'a str>,
}

pub struct PaymentPages {
    tera: Tera,
}

impl PaymentPages {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_template(PAYMENT_TEMPLATE, include_str!("../templates/payment.html"))?;
        Ok(Self { tera })
    }

    pub fn render_payment(&self, view: &PaymentView<'_>) -> Result<String, tera::Error> {
        let context = Context::from_serialize(view)?;
        self.tera.render(PAYMENT_TEMPLATE, &context)
    }
}
