use crate::harness::{TestApp, category_form, png_bytes, routes};

mod category_crud {
    use super::*;

    #[tokio::test]
    async fn create_with_image_returns_stored_handle() {
        let app = TestApp::spawn().await;

        let res = app
            .post_multipart(
                routes::CATEGORIES,
                category_form("Shoes", "Footwear", Some(png_bytes())),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["name"].as_str().unwrap(), "Shoes");
        assert_eq!(res.body["description"].as_str().unwrap(), "Footwear");

        let handle = res.body["image"].as_str().expect("image handle");
        // Uploads are re-encoded to the configured format (jpeg here).
        assert!(handle.ends_with(".jpg"), "unexpected handle: {handle}");
        assert!(app.blob_exists(handle).await);
    }

    #[tokio::test]
    async fn create_without_image() {
        let app = TestApp::spawn().await;

        let res = app
            .post_multipart(routes::CATEGORIES, category_form("Hats", "Headwear", None))
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["image"].is_null());
    }

    #[tokio::test]
    async fn create_rejects_missing_name() {
        let app = TestApp::spawn().await;

        let form = reqwest::multipart::Form::new().text("description", "No name");
        let res = app.post_multipart(routes::CATEGORIES, form).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"].as_str().unwrap(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn create_rejects_undecodable_image() {
        let app = TestApp::spawn().await;

        let res = app
            .post_multipart(
                routes::CATEGORIES,
                category_form("Bags", "Luggage", Some(b"not an image".to_vec())),
            )
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"].as_str().unwrap(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn get_returns_created_category() {
        let app = TestApp::spawn().await;
        let id = app.create_category("Socks", None).await;

        let res = app.get(&routes::category(id)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.id(), id);
        assert_eq!(res.body["name"].as_str().unwrap(), "Socks");
    }

    #[tokio::test]
    async fn get_missing_category_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::category(4242)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"].as_str().unwrap(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn list_returns_all_categories() {
        let app = TestApp::spawn().await;
        app.create_category("One", None).await;
        app.create_category("Two", Some(png_bytes())).await;

        let res = app.get(routes::CATEGORIES).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"].as_u64().unwrap(), 2);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 2);
    }
}

mod category_update {
    use super::*;

    #[tokio::test]
    async fn update_replaces_stored_image() {
        let app = TestApp::spawn().await;

        let created = app
            .post_multipart(
                routes::CATEGORIES,
                category_form("Shoes", "Footwear", Some(png_bytes())),
            )
            .await;
        let id = created.id();
        let old_handle = created.body["image"].as_str().unwrap().to_string();

        let res = app
            .put_multipart(
                &routes::category(id),
                category_form("Sneakers", "Sport footwear", Some(png_bytes())),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"].as_str().unwrap(), "Sneakers");

        let new_handle = res.body["image"].as_str().unwrap();
        assert_ne!(new_handle, old_handle);
        assert!(app.blob_exists(new_handle).await);
        assert!(!app.blob_exists(&old_handle).await);
    }

    #[tokio::test]
    async fn update_without_image_clears_it() {
        let app = TestApp::spawn().await;

        let created = app
            .post_multipart(
                routes::CATEGORIES,
                category_form("Shoes", "Footwear", Some(png_bytes())),
            )
            .await;
        let id = created.id();
        let old_handle = created.body["image"].as_str().unwrap().to_string();

        let res = app
            .put_multipart(&routes::category(id), category_form("Shoes", "Footwear", None))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["image"].is_null());
        assert!(!app.blob_exists(&old_handle).await);
    }

    #[tokio::test]
    async fn update_missing_category_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .put_multipart(
                &routes::category(4242),
                category_form("Ghost", "Nothing here", None),
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"].as_str().unwrap(), "NOT_FOUND");
    }
}

mod category_delete {
    use super::*;

    #[tokio::test]
    async fn delete_removes_record_and_blob() {
        let app = TestApp::spawn().await;

        let created = app
            .post_multipart(
                routes::CATEGORIES,
                category_form("Shoes", "Footwear", Some(png_bytes())),
            )
            .await;
        let id = created.id();
        let handle = created.body["image"].as_str().unwrap().to_string();

        let res = app.delete(&routes::category(id)).await;
        assert_eq!(res.status, 204);

        assert_eq!(app.get(&routes::category(id)).await.status, 404);
        assert!(!app.blob_exists(&handle).await);
    }

    #[tokio::test]
    async fn delete_missing_category_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.delete(&routes::category(4242)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"].as_str().unwrap(), "NOT_FOUND");
    }
}

mod image_download {
    use super::*;

    #[tokio::test]
    async fn stored_image_is_served_in_target_format() {
        let app = TestApp::spawn().await;

        let created = app
            .post_multipart(
                routes::CATEGORIES,
                category_form("Shoes", "Footwear", Some(png_bytes())),
            )
            .await;
        let handle = created.body["image"].as_str().unwrap();

        let (status, content_type, bytes) = app.get_bytes(&routes::image(handle)).await;

        assert_eq!(status, 200);
        assert_eq!(content_type.as_deref(), Some("image/jpeg"));
        assert_eq!(
            image::guess_format(&bytes).expect("served bytes should be an image"),
            image::ImageFormat::Jpeg
        );
    }

    #[tokio::test]
    async fn unknown_handle_is_not_found() {
        let app = TestApp::spawn().await;

        let (status, _, _) = app
            .get_bytes(&routes::image("00000000000000000000000000000000.jpg"))
            .await;

        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn malformed_handle_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::image("..%2F..%2Fetc%2Fpasswd")).await;

        assert_eq!(res.status, 404);
    }
}
