//! Storefront cart and checkout flows against the mock backend.

#![allow(clippy::unwrap_used)]

use blessed_integration_tests::{
    MockBackend, SANDBOX_PAYMENT_URL, browser, location, sample_drop, sample_product,
    start_storefront,
};
use reqwest::StatusCode;

async fn storefront() -> (MockBackend, String) {
    let drop = sample_drop("02", true);
    let product = sample_product("tee-boxy-negra", &drop.id);
    let backend = MockBackend::with_catalog(vec![drop], vec![product]);
    let backend_url = backend.start().await;
    let base = start_storefront(&backend_url).await;
    (backend, base)
}

/// First `line_id` hidden input in a cart page.
fn first_line_id(html: &str) -> String {
    let marker = r#"name="line_id" value=""#;
    let start = html.find(marker).unwrap() + marker.len();
    let end = html[start..].find('"').unwrap();
    html[start..start + end].to_string()
}

#[tokio::test]
async fn test_health() {
    let (_backend, base) = storefront().await;
    let client = browser();

    let resp = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let resp = client.get(format!("{base}/health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_home_lists_drops_and_featured_products() {
    let (_backend, base) = storefront().await;
    let resp = browser().get(format!("{base}/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    assert!(html.contains("Boxy Tee Negra"));
    assert!(html.contains("/drops/drop02"));
}

#[tokio::test]
async fn test_readiness_fails_without_backend() {
    let base = start_storefront("http://127.0.0.1:9").await;
    let resp = browser()
        .get(format!("{base}/health/ready"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_add_to_cart_fragment_and_redirect() {
    let (_backend, base) = storefront().await;
    let client = browser();

    let resp = client
        .post(format!("{base}/cart/add"))
        .header("HX-Request", "true")
        .form(&[("product_id", "tee-boxy-negra"), ("size", "M")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("HX-Trigger").and_then(|v| v.to_str().ok()),
        Some("cart-updated")
    );
    assert!(resp.text().await.unwrap().contains(r#"<span class="cart-count">1</span>"#));

    // Same variant again merges into one line
    let resp = client
        .post(format!("{base}/cart/add"))
        .form(&[("product_id", "tee-boxy-negra"), ("size", "M")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("/cart"));

    let html = client
        .get(format!("{base}/cart"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(html.matches(r#"name="line_id""#).count(), 2);
    assert!(html.contains("$102.000"));

    let count = client
        .get(format!("{base}/cart/count"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(count.contains(">2<"));
}

#[tokio::test]
async fn test_add_to_cart_rejects_bad_input() {
    let (_backend, base) = storefront().await;
    let client = browser();

    let resp = client
        .post(format!("{base}/cart/add"))
        .form(&[("product_id", "tee-boxy-negra"), ("size", "L")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.text().await.unwrap(), "Ese talle no tiene stock.");

    let resp = client
        .post(format!("{base}/cart/add"))
        .form(&[("product_id", "tee-boxy-negra"), ("size", "")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .post(format!("{base}/cart/add"))
        .form(&[("product_id", "no-existe"), ("size", "M")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_and_remove_line() {
    let (_backend, base) = storefront().await;
    let client = browser();

    client
        .post(format!("{base}/cart/add"))
        .form(&[("product_id", "tee-boxy-negra"), ("size", "M")])
        .send()
        .await
        .unwrap();
    let html = client
        .get(format!("{base}/cart"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let line_id = first_line_id(&html);

    let resp = client
        .post(format!("{base}/cart/update"))
        .header("HX-Request", "true")
        .form(&[("line_id", line_id.as_str()), ("quantity", "3")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("$153.000"));

    // Zero removes the line
    let resp = client
        .post(format!("{base}/cart/update"))
        .header("HX-Request", "true")
        .form(&[("line_id", line_id.as_str()), ("quantity", "0")])
        .send()
        .await
        .unwrap();
    assert!(resp.text().await.unwrap().contains("Tu carrito está vacío."));

    let resp = client
        .post(format!("{base}/cart/remove"))
        .form(&[("line_id", line_id.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_huge_quantity_is_capped() {
    let (_backend, base) = storefront().await;
    let client = browser();

    let add = || {
        client
            .post(format!("{base}/cart/add"))
            .header("HX-Request", "true")
            .form(&[("product_id", "tee-boxy-negra"), ("size", "M")])
            .send()
    };
    add().await.unwrap();
    let html = client
        .get(format!("{base}/cart"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let line_id = first_line_id(&html);

    let resp = client
        .post(format!("{base}/cart/update"))
        .header("HX-Request", "true")
        .form(&[("line_id", line_id.as_str()), ("quantity", "99999999999")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = add().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains(r#"<span class="cart-count">99</span>"#));

    let html = client
        .get(format!("{base}/cart"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("$5.049.000"));
}

#[tokio::test]
async fn test_checkout_with_empty_cart_goes_home() {
    let (_backend, base) = storefront().await;
    let resp = browser()
        .get(format!("{base}/checkout"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("/"));
}

#[tokio::test]
async fn test_full_checkout() {
    let (backend, base) = storefront().await;
    let client = browser();

    client
        .post(format!("{base}/cart/add"))
        .form(&[("product_id", "tee-boxy-negra"), ("size", "M")])
        .send()
        .await
        .unwrap();

    // Step 1
    let resp = client
        .post(format!("{base}/checkout/contact"))
        .form(&[("email", "no-es-un-mail")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = client
        .post(format!("{base}/checkout/contact"))
        .form(&[("email", "ana@mail.com"), ("newsletter", "on")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    // Quote fragment prices both carriers
    let quote = client
        .post(format!("{base}/checkout/shipping-quote"))
        .form(&[("codigo_postal", "1043")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(quote.contains("$6.900"));

    // Step 2
    let address = [
        ("nombre", "Ana"),
        ("apellido", "Pérez"),
        ("telefono", "1155550000"),
        ("codigo_postal", "1043"),
        ("calle", "Corrientes"),
        ("numero", "900"),
        ("piso", "3"),
        ("depto", "B"),
        ("localidad", "CABA"),
        ("provincia", "Buenos Aires"),
    ];
    let resp = client
        .post(format!("{base}/checkout/delivery"))
        .form(&address)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY, "carrier required");

    let mut with_carrier = address.to_vec();
    with_carrier.push(("carrier", "correo_estandar"));
    let resp = client
        .post(format!("{base}/checkout/delivery"))
        .form(&with_carrier)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let review = client
        .get(format!("{base}/checkout"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(review.contains("Corrientes 900, 3 B"));
    assert!(review.contains("$57.900"));

    // Step 3
    let resp = client
        .post(format!("{base}/checkout/pay"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some(SANDBOX_PAYMENT_URL));

    {
        let data = backend.data();
        assert_eq!(data.checkouts.len(), 1);
        let request = data.checkouts.first().unwrap();
        assert_eq!(request["email"], "ana@mail.com");
        assert_eq!(request["items"].as_array().map(Vec::len), Some(1));
        assert_eq!(request["shipping"]["address"]["cp"], "1043");
    }

    // Returning from the processor empties the cart
    let resp = client
        .get(format!("{base}/checkout/success?payment_id=99&merchant_order_id=7"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("¡Pago realizado!"));

    let resp = client
        .get(format!("{base}/checkout"))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp).as_deref(), Some("/"));
}

#[tokio::test]
async fn test_payment_failure_keeps_cart() {
    let (backend, base) = storefront().await;
    backend.data().fail_checkout = true;
    let client = browser();

    client
        .post(format!("{base}/cart/add"))
        .form(&[("product_id", "tee-boxy-negra"), ("size", "M")])
        .send()
        .await
        .unwrap();
    client
        .post(format!("{base}/checkout/contact"))
        .form(&[("email", "ana@mail.com")])
        .send()
        .await
        .unwrap();
    client
        .post(format!("{base}/checkout/delivery"))
        .form(&[
            ("nombre", "Ana"),
            ("apellido", "Pérez"),
            ("telefono", "1155550000"),
            ("codigo_postal", "5000"),
            ("calle", "Colón"),
            ("numero", "1200"),
            ("localidad", "Córdoba"),
            ("provincia", "Córdoba"),
            ("carrier", "oca_estandar"),
        ])
        .send()
        .await
        .unwrap();

    let resp = client
        .post(format!("{base}/checkout/pay"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

    let resp = client
        .get(format!("{base}/checkout/failure"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let count = client
        .get(format!("{base}/cart/count"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(count.contains(">1<"));
}

#[tokio::test]
async fn test_unknown_payment_status_is_not_found() {
    let (_backend, base) = storefront().await;
    let resp = browser()
        .get(format!("{base}/checkout/refunded"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
