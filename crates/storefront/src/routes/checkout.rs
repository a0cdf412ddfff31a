//! Checkout wizard and payment result handlers.
//!
//! Three steps (contact, delivery, payment) kept in the session as
//! [`CheckoutProgress`]. Each step form posts to its own endpoint and
//! redirects back to `GET /checkout`, which renders whichever step is current.
//! Paying creates a payment preference through the backend and sends the
//! buyer to the hosted payment page; the processor returns them to
//! `/checkout/{success|failure|pending}`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use blessed_core::checkout::{
    CheckoutError, CheckoutRequest, ContactDetails, DeliveryForm, PAYMENT_ERROR_MESSAGE,
    PaymentReturn, PaymentStatus,
};
use blessed_core::shipping::{Carrier, PostalCode, ShippingError, ShippingOption, quote};
use blessed_core::wizard::{CheckoutStep, StepIndicator, indicators};
use blessed_core::{Cart, format_price};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::cart::{CartView, load_cart, load_progress, save_cart, save_progress};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::models::{CheckoutProgress, session_keys};
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// Order totals shown beside every step.
#[derive(Clone)]
pub struct SummaryView {
    pub subtotal: String,
    /// `None` until a carrier is chosen.
    pub shipping: Option<String>,
    pub total: String,
    pub installments: String,
}

impl SummaryView {
    fn new(cart: &Cart, shipping: Option<&ShippingOption>) -> Self {
        let cost = shipping.map_or(Decimal::ZERO, |s| s.cost);
        let total = cart.total() + cost;
        Self {
            subtotal: format_price(cart.total()),
            shipping: shipping.map(|s| format_price(s.cost)),
            total: format_price(total),
            installments: blessed_core::installment_hint(total),
        }
    }
}

/// A carrier choice. `cost` is unknown until a postal code is entered.
#[derive(Clone)]
pub struct ShippingOptionView {
    pub id: &'static str,
    pub name: &'static str,
    pub logo: &'static str,
    pub description: &'static str,
    pub estimated_days: &'static str,
    pub cost: Option<String>,
    pub selected: bool,
}

impl ShippingOptionView {
    fn new(carrier: Carrier, cost: Option<Decimal>, selected: Option<Carrier>) -> Self {
        Self {
            id: carrier.id(),
            name: carrier.name(),
            logo: carrier.logo(),
            description: carrier.description(),
            estimated_days: carrier.estimated_days(),
            cost: cost.map(format_price),
            selected: selected == Some(carrier),
        }
    }
}

/// Options for a postal code, or every carrier unpriced when there is none.
fn shipping_options(cp: Option<PostalCode>, selected: Option<Carrier>) -> Vec<ShippingOptionView> {
    match cp {
        Some(cp) => quote(cp)
            .into_iter()
            .map(|o| ShippingOptionView::new(o.carrier, Some(o.cost), selected))
            .collect(),
        None => Carrier::ALL
            .into_iter()
            .map(|c| ShippingOptionView::new(c, None, selected))
            .collect(),
    }
}

/// What the buyer confirmed, shown on the payment step.
#[derive(Clone)]
pub struct ReviewView {
    pub email: String,
    pub name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub carrier: &'static str,
    pub estimated_days: &'static str,
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub steps: Vec<StepIndicator>,
    /// `contact`, `delivery` or `payment`.
    pub step: &'static str,
    pub cart: CartView,
    pub summary: SummaryView,
    pub email: String,
    pub newsletter: bool,
    pub delivery: DeliveryForm,
    pub shipping_options: Vec<ShippingOptionView>,
    pub review: Option<ReviewView>,
    pub error: Option<String>,
}

impl CheckoutTemplate {
    fn new(cart: &Cart, progress: &CheckoutProgress) -> Self {
        let option = progress.shipping_option();
        let delivery = progress
            .delivery
            .as_ref()
            .map(|d| d.form.clone())
            .unwrap_or_default();
        let cp = progress.delivery.as_ref().and_then(|d| d.postal_code().ok());

        let review = progress
            .ready_to_pay()
            .map(|(contact, details, option)| {
                let address = details.address();
                ReviewView {
                    email: contact.email.to_string(),
                    name: format!("{} {}", address.nombre, address.apellido),
                    street: address.calle,
                    city: format!("{}, {}", address.localidad, address.provincia),
                    postal_code: address.cp,
                    carrier: option.carrier.name(),
                    estimated_days: option.carrier.estimated_days(),
                }
            });

        Self {
            steps: indicators(progress.step),
            step: step_name(progress.step),
            cart: CartView::from(cart),
            summary: SummaryView::new(cart, option.as_ref()),
            email: progress
                .contact
                .as_ref()
                .map(|c| c.email.to_string())
                .unwrap_or_default(),
            newsletter: progress.contact.as_ref().is_some_and(|c| c.newsletter),
            delivery,
            shipping_options: shipping_options(cp, progress.carrier),
            review,
            error: None,
        }
    }

    fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

const fn step_name(step: CheckoutStep) -> &'static str {
    match step {
        CheckoutStep::Contact => "contact",
        CheckoutStep::Delivery => "delivery",
        CheckoutStep::Payment => "payment",
    }
}

/// Shipping options fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/shipping_options.html")]
pub struct ShippingOptionsTemplate {
    pub options: Vec<ShippingOptionView>,
    pub error: Option<String>,
}

/// Payment result page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/result.html")]
pub struct ResultTemplate {
    pub success: bool,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub button_label: &'static str,
    pub button_href: &'static str,
    pub payment_id: Option<String>,
    pub order_id: Option<String>,
}

// =============================================================================
// Forms
// =============================================================================

/// Step 1 form data.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub email: String,
    /// Checkbox; present when ticked.
    pub newsletter: Option<String>,
}

/// Step 2 form data.
#[derive(Debug, Deserialize)]
pub struct DeliveryStepForm {
    #[serde(flatten)]
    pub address: DeliveryForm,
    pub carrier: Option<String>,
}

/// Shipping quote form data.
#[derive(Debug, Deserialize)]
pub struct QuoteForm {
    #[serde(default)]
    pub codigo_postal: String,
    pub carrier: Option<String>,
}

fn parse_carrier(raw: Option<&str>) -> std::result::Result<Carrier, ShippingError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(id) => id.parse(),
        None => Err(ShippingError::NoCarrierSelected),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the current checkout step.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Response {
    let cart = load_cart(&session).await;
    if cart.is_empty() {
        return Redirect::to("/").into_response();
    }
    let progress = load_progress(&session).await;
    CheckoutTemplate::new(&cart, &progress).into_response()
}

/// Step 1: contact details.
#[instrument(skip(session, form))]
pub async fn contact(session: Session, Form(form): Form<ContactForm>) -> Result<Response> {
    let cart = load_cart(&session).await;
    if cart.is_empty() {
        return Ok(Redirect::to("/").into_response());
    }
    let mut progress = load_progress(&session).await;

    match ContactDetails::parse(&form.email, form.newsletter.is_some()) {
        Ok(details) => {
            progress.set_contact(details);
            save_progress(&session, &progress).await?;
            Ok(Redirect::to("/checkout").into_response())
        }
        Err(e) => {
            let mut page = CheckoutTemplate::new(&cart, &progress).with_error(e.to_string());
            page.email = form.email;
            page.newsletter = form.newsletter.is_some();
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
    }
}

/// Price both carriers for a postal code.
#[instrument(skip(form))]
pub async fn shipping_quote(Form(form): Form<QuoteForm>) -> impl IntoResponse {
    let selected = form.carrier.as_deref().and_then(|c| c.parse().ok());
    match PostalCode::parse(&form.codigo_postal) {
        Ok(cp) => ShippingOptionsTemplate {
            options: shipping_options(Some(cp), selected),
            error: None,
        },
        Err(e) => ShippingOptionsTemplate {
            options: shipping_options(None, selected),
            error: Some(e.to_string()),
        },
    }
}

/// Step 2: delivery address and carrier.
#[instrument(skip(session, form))]
pub async fn delivery(session: Session, Form(form): Form<DeliveryStepForm>) -> Result<Response> {
    let cart = load_cart(&session).await;
    if cart.is_empty() {
        return Ok(Redirect::to("/").into_response());
    }
    let mut progress = load_progress(&session).await;
    if progress.contact.is_none() {
        return Ok(Redirect::to("/checkout").into_response());
    }

    let entered = form.address.clone();
    let result = form
        .address
        .validate()
        .and_then(|details| {
            parse_carrier(form.carrier.as_deref())
                .map(|carrier| (details, carrier))
                .map_err(CheckoutError::from)
        });

    match result {
        Ok((details, carrier)) => {
            progress.set_delivery(details, carrier);
            save_progress(&session, &progress).await?;
            Ok(Redirect::to("/checkout").into_response())
        }
        Err(e) => {
            let selected = form.carrier.as_deref().and_then(|c| c.parse().ok());
            let mut page = CheckoutTemplate::new(&cart, &progress).with_error(e.to_string());
            page.shipping_options =
                shipping_options(PostalCode::parse(&entered.codigo_postal).ok(), selected);
            page.delivery = entered;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
    }
}

/// Go back one step.
#[instrument(skip(session))]
pub async fn back(session: Session) -> Result<Redirect> {
    let mut progress = load_progress(&session).await;
    progress.back();
    save_progress(&session, &progress).await?;
    Ok(Redirect::to("/checkout"))
}

/// Step 3: create the payment preference and hand off to the processor.
#[instrument(skip(state, session))]
pub async fn pay(State(state): State<AppState>, session: Session) -> Result<Response> {
    let cart = load_cart(&session).await;
    if cart.is_empty() {
        return Ok(Redirect::to("/").into_response());
    }
    let progress = load_progress(&session).await;
    let Some((contact, delivery, option)) = progress.ready_to_pay() else {
        return Ok(Redirect::to("/checkout").into_response());
    };

    let request = CheckoutRequest::new(cart.lines().to_vec(), contact, delivery, &option);
    match state.backend().create_checkout(&request).await {
        Ok(preference) => {
            add_breadcrumb(
                "checkout",
                "Payment preference created",
                Some(&[("preference_id", preference.preference_id.as_str())][..]),
            );
            let url = preference.redirect_url(state.config().payment_sandbox);
            Ok(Redirect::to(url).into_response())
        }
        Err(e) => {
            tracing::error!("Failed to create payment preference: {e}");
            let page = CheckoutTemplate::new(&cart, &progress).with_error(PAYMENT_ERROR_MESSAGE);
            Ok((StatusCode::BAD_GATEWAY, page).into_response())
        }
    }
}

/// Payment result page. A successful payment empties the cart.
#[instrument(skip(session))]
pub async fn result(
    session: Session,
    Path(status): Path<String>,
    Query(params): Query<PaymentReturn>,
) -> Result<ResultTemplate> {
    let status: PaymentStatus = status
        .parse()
        .map_err(|()| AppError::NotFound(format!("checkout/{status}")))?;

    if status.clears_cart() {
        save_cart(&session, &Cart::new()).await?;
        session
            .remove::<CheckoutProgress>(session_keys::CHECKOUT)
            .await?;
    }

    Ok(ResultTemplate {
        success: status == PaymentStatus::Success,
        title: status.title(),
        subtitle: status.subtitle(),
        button_label: status.button_label(),
        button_href: status.button_href(),
        payment_id: params.payment_id,
        order_id: params.merchant_order_id,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use blessed_core::NewCartItem;

    use super::*;

    fn cart() -> Cart {
        let mut cart = Cart::new();
        cart.add(NewCartItem {
            product: "Boxy Tee".to_string(),
            price: Decimal::from(51_000),
            size: "M".to_string(),
            color: None,
            image: None,
        })
        .unwrap();
        cart
    }

    fn delivery(cp: &str) -> DeliveryForm {
        DeliveryForm {
            nombre: "Ana".to_string(),
            apellido: "Pérez".to_string(),
            telefono: "1155550000".to_string(),
            codigo_postal: cp.to_string(),
            calle: "Corrientes".to_string(),
            numero: "900".to_string(),
            piso: "3".to_string(),
            depto: "B".to_string(),
            localidad: "CABA".to_string(),
            provincia: "Buenos Aires".to_string(),
        }
    }

    #[test]
    fn test_summary_adds_shipping() {
        let option = ShippingOption {
            carrier: Carrier::OcaEstandar,
            cost: Decimal::from(8_500),
        };
        let summary = SummaryView::new(&cart(), Some(&option));
        assert_eq!(summary.subtotal, "$51.000");
        assert_eq!(summary.shipping.as_deref(), Some("$8.500"));
        assert_eq!(summary.total, "$59.500");
        assert_eq!(summary.installments, "3 cuotas sin interés de $19.833");

        let summary = SummaryView::new(&cart(), None);
        assert_eq!(summary.shipping, None);
        assert_eq!(summary.total, "$51.000");
    }

    #[test]
    fn test_shipping_options_unpriced_without_postal_code() {
        let options = shipping_options(None, Some(Carrier::CorreoEstandar));
        assert_eq!(options.len(), 2);
        assert!(options.iter().all(|o| o.cost.is_none()));
        assert!(options.get(1).is_some_and(|o| o.selected));

        let options = shipping_options(PostalCode::parse("2500").ok(), None);
        assert_eq!(options.first().unwrap().cost.as_deref(), Some("$10.500"));
        assert_eq!(options.get(1).unwrap().cost.as_deref(), Some("$8.900"));
    }

    #[test]
    fn test_parse_carrier_requires_selection() {
        assert_eq!(parse_carrier(None), Err(ShippingError::NoCarrierSelected));
        assert_eq!(parse_carrier(Some(" ")), Err(ShippingError::NoCarrierSelected));
        assert_eq!(parse_carrier(Some("oca_estandar")), Ok(Carrier::OcaEstandar));
        assert!(matches!(
            parse_carrier(Some("dhl")),
            Err(ShippingError::UnknownCarrier(_))
        ));
    }

    #[test]
    fn test_template_follows_progress() {
        let mut progress = CheckoutProgress::default();
        let page = CheckoutTemplate::new(&cart(), &progress);
        assert_eq!(page.step, "contact");
        assert!(page.review.is_none());
        assert!(page.steps.first().is_some_and(|s| s.active));

        progress.set_contact(ContactDetails::parse("ana@mail.com", true).unwrap());
        progress.set_delivery(delivery("1043").validate().unwrap(), Carrier::CorreoEstandar);
        let page = CheckoutTemplate::new(&cart(), &progress);
        assert_eq!(page.step, "payment");
        assert_eq!(page.email, "ana@mail.com");
        assert!(page.newsletter);
        assert_eq!(page.summary.shipping.as_deref(), Some("$6.900"));

        let review = page.review.unwrap();
        assert_eq!(review.street, "Corrientes 900, 3 B");
        assert_eq!(review.carrier, "Correo Argentino");
        assert_eq!(review.postal_code, "1043");
    }
}
