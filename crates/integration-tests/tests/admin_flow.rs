//! Admin login, drop management and the product upload wizard against the
//! mock backend.

#![allow(clippy::unwrap_used)]

use blessed_integration_tests::{
    ADMIN_PASSWORD, ADMIN_USERNAME, MockBackend, browser, location, sample_drop, sample_product,
    start_admin,
};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};

async fn admin() -> (MockBackend, String) {
    let drop = sample_drop("02", true);
    let product = sample_product("tee-boxy-negra", &drop.id);
    let backend = MockBackend::with_catalog(vec![drop, sample_drop("01", false)], vec![product]);
    let backend_url = backend.start().await;
    let base = start_admin(&backend_url).await;
    (backend, base)
}

async fn logged_in(base: &str) -> reqwest::Client {
    let client = browser();
    let resp = client
        .post(format!("{base}/auth/login"))
        .form(&[("username", ADMIN_USERNAME), ("password", ADMIN_PASSWORD)])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("/"));
    client
}

async fn page(client: &reqwest::Client, url: &str) -> String {
    client.get(url).send().await.unwrap().text().await.unwrap()
}

fn jpeg(name: &str) -> Form {
    let part = Part::bytes(vec![0xFF, 0xD8, 0xFF, 0xE0, 0, 16, b'J', b'F', b'I', b'F'])
        .file_name(name.to_owned())
        .mime_str("image/jpeg")
        .unwrap();
    Form::new().part("file", part)
}

#[tokio::test]
async fn test_requires_login() {
    let (_backend, base) = admin().await;
    let client = browser();

    let resp = client.get(format!("{base}/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("/auth/login"));

    let resp = client
        .post(format!("{base}/drops/drop02/toggle"))
        .header("HX-Request", "true")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let (_backend, base) = admin().await;
    let client = browser();

    let resp = client
        .post(format!("{base}/auth/login"))
        .form(&[("username", ADMIN_USERNAME), ("password", "adivinando")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.text().await.unwrap().contains("Usuario o contraseña incorrectos."));

    let resp = client
        .post(format!("{base}/auth/login"))
        .form(&[("username", ADMIN_USERNAME), ("password", "")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_and_logout() {
    let (_backend, base) = admin().await;
    let client = logged_in(&base).await;

    let html = page(&client, &format!("{base}/")).await;
    assert!(html.contains("Boxy Tee Negra"));
    assert!(html.contains(ADMIN_USERNAME));

    // Already logged in: the login page bounces to the panel
    let resp = client.get(format!("{base}/auth/login")).send().await.unwrap();
    assert_eq!(location(&resp).as_deref(), Some("/"));

    let resp = client.post(format!("{base}/auth/logout")).send().await.unwrap();
    assert_eq!(location(&resp).as_deref(), Some("/auth/login"));

    let resp = client.get(format!("{base}/")).send().await.unwrap();
    assert_eq!(location(&resp).as_deref(), Some("/auth/login"));
}

#[tokio::test]
async fn test_product_search_fragment() {
    let (_backend, base) = admin().await;
    let client = logged_in(&base).await;

    let resp = client
        .get(format!("{base}/products?q=boxy"))
        .header("HX-Request", "true")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Boxy Tee Negra"));

    let html = client
        .get(format!("{base}/products?q=campera"))
        .header("HX-Request", "true")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(!html.contains("Boxy Tee Negra"));

    let resp = client
        .get(format!("{base}/products?q=boxy"))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp).as_deref(), Some("/?tab=products&q=boxy"));
}

#[tokio::test]
async fn test_create_and_toggle_drop() {
    let (backend, base) = admin().await;
    let client = logged_in(&base).await;

    let resp = client
        .post(format!("{base}/drops"))
        .form(&[("number", "03"), ("label", "Invierno")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(backend.data().drops.iter().all(|d| d.id.as_str() != "drop03"));

    let resp = client
        .post(format!("{base}/drops"))
        .form(&[
            ("number", "03"),
            ("label", "Invierno"),
            ("tagline", "Frío afuera"),
            ("description", "Buzos pesados."),
            ("hero_image", "https://res.cloudinary.com/blessed/image/upload/v1/d3.jpg"),
            ("accent_color", "#334455"),
            ("release_date", "2026-06-01T18:00"),
            ("total_pieces", "80"),
            ("active", "on"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("/?tab=drops"));
    {
        let data = backend.data();
        let created = data.drops.iter().find(|d| d.id.as_str() == "drop03").unwrap();
        assert_eq!(created.total_pieces, 80);
        assert!(created.active);
    }

    let html = page(&client, &format!("{base}/?tab=drops")).await;
    assert!(html.contains("creado correctamente."));
    assert!(html.contains("Invierno"));

    // Toggle returns the refreshed list to the page script
    let resp = client
        .post(format!("{base}/drops/drop03/toggle"))
        .header("HX-Request", "true")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Invierno"));
    assert!(!backend.data().drops.iter().find(|d| d.id.as_str() == "drop03").unwrap().active);

    // The cached list reflects the toggle without another fetch
    let html = page(&client, &format!("{base}/?tab=drops")).await;
    assert!(html.contains("desactivado."));

    let resp = client
        .post(format!("{base}/drops/drop03/delete"))
        .form(&[("label", "Invierno")])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp).as_deref(), Some("/?tab=drops"));
    assert!(backend.data().drops.iter().all(|d| d.id.as_str() != "drop03"));
}

#[tokio::test]
async fn test_product_wizard() {
    let (backend, base) = admin().await;
    let client = logged_in(&base).await;

    let html = page(&client, &format!("{base}/products/new")).await;
    assert!(html.contains("drop02"));

    let details = [
        ("id", "hoodie-gris"),
        ("name", "Hoodie Gris"),
        ("cat", "hoodies"),
        ("drop", "drop02"),
        ("price", "90000"),
        ("original_price", "90000"),
        ("is_new", "on"),
        ("description", "Frisa pesada."),
    ];
    let resp = client
        .post(format!("{base}/products/new/details"))
        .form(&[("id", "hoodie-gris"), ("name", ""), ("cat", "hoodies")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = client
        .post(format!("{base}/products/new/details"))
        .form(&details)
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp).as_deref(), Some("/products/new"));

    // Review without a main image bounces back with an error
    client
        .post(format!("{base}/products/new/review"))
        .send()
        .await
        .unwrap();
    let html = page(&client, &format!("{base}/products/new")).await;
    assert!(html.contains("La foto principal es obligatoria."));

    // Non-image files are refused before reaching the backend
    let text = Form::new().part(
        "file",
        Part::bytes(b"hola".to_vec())
            .file_name("notas.txt")
            .mime_str("text/plain")
            .unwrap(),
    );
    let resp = client
        .post(format!("{base}/products/new/images/0"))
        .header("HX-Request", "true")
        .multipart(text)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp.text().await.unwrap().contains("El archivo no es una imagen."));
    assert!(backend.data().uploads.is_empty());

    let resp = client
        .post(format!("{base}/products/new/images/0"))
        .header("HX-Request", "true")
        .multipart(jpeg("frente.jpg"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("product-1.jpg"));

    let resp = client
        .post(format!("{base}/products/new/images/9"))
        .header("HX-Request", "true")
        .multipart(jpeg("extra.jpg"))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_client_error());

    {
        let data = backend.data();
        assert_eq!(data.uploads.len(), 1);
        let upload = data.uploads.first().unwrap();
        assert_eq!(upload.kind, "product");
        assert_eq!(upload.file_name, "frente.jpg");
        assert_eq!(upload.content_type, "image/jpeg");
        assert_eq!(upload.size, 10);
    }

    let resp = client
        .post(format!("{base}/products/new/review"))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp).as_deref(), Some("/products/new"));

    let resp = client
        .post(format!("{base}/products/new/submit"))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp).as_deref(), Some("/?tab=products"));

    {
        let data = backend.data();
        let created = data
            .products
            .iter()
            .find(|p| p.id.as_str() == "hoodie-gris")
            .unwrap();
        assert_eq!(created.cat, "hoodies");
        assert_eq!(
            created.images,
            vec!["https://res.cloudinary.com/blessed/image/upload/v1/product-1.jpg".to_string()]
        );
        assert!(!created.is_sale);
    }

    let html = page(&client, &format!("{base}/?tab=products")).await;
    assert!(html.contains("agregado correctamente."));
    assert!(html.contains("Hoodie Gris"));

    // The draft is gone once submitted
    let html = page(&client, &format!("{base}/products/new")).await;
    assert!(!html.contains("Frisa pesada."));
}

#[tokio::test]
async fn test_wizard_cancel_discards_uploads() {
    let (backend, base) = admin().await;
    let client = logged_in(&base).await;

    client
        .post(format!("{base}/products/new/images/0"))
        .header("HX-Request", "true")
        .multipart(jpeg("a.jpg"))
        .send()
        .await
        .unwrap();
    // Replacing a slot discards the previous upload
    client
        .post(format!("{base}/products/new/images/0"))
        .header("HX-Request", "true")
        .multipart(jpeg("b.jpg"))
        .send()
        .await
        .unwrap();

    let resp = client
        .post(format!("{base}/products/new/cancel"))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp).as_deref(), Some("/?tab=products"));

    // Deletions run in the background
    for _ in 0..50 {
        if backend.data().deleted_images.len() == 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    let mut deleted = backend.data().deleted_images.clone();
    deleted.sort();
    assert_eq!(deleted, vec!["blessed/product-1", "blessed/product-2"]);
}

#[tokio::test]
async fn test_replacing_slot_image_deletes_previous_upload() {
    let (backend, base) = admin().await;
    let client = logged_in(&base).await;

    let mut fragment = String::new();
    for name in ["a.jpg", "b.jpg"] {
        let resp = client
            .post(format!("{base}/products/new/images/0"))
            .header("HX-Request", "true")
            .multipart(jpeg(name))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        fragment = resp.text().await.unwrap();
    }
    assert!(fragment.contains("product-2.jpg"));
    assert!(!fragment.contains("product-1.jpg"));

    for _ in 0..50 {
        if !backend.data().deleted_images.is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert_eq!(backend.data().deleted_images, vec!["blessed/product-1"]);
}

#[tokio::test]
async fn test_delete_product_is_idempotent() {
    let (backend, base) = admin().await;
    let client = logged_in(&base).await;

    for _ in 0..2 {
        let resp = client
            .post(format!("{base}/products/tee-boxy-negra/delete"))
            .form(&[("name", "Boxy Tee Negra")])
            .send()
            .await
            .unwrap();
        assert_eq!(location(&resp).as_deref(), Some("/?tab=products"));
        let html = page(&client, &format!("{base}/?tab=products")).await;
        assert!(html.contains("eliminado."));
    }
    assert!(backend.data().products.is_empty());
}
