use api_contract::ApiResponse;

#[test]
fn api_response_success() {
    let response = ApiResponse::success("ok");
    assert!(response.success);
    assert!(response.data.is_some());
    assert!(response.error.is_none());
}

#[test]
fn api_response_error() {
    let response = ApiResponse::<()>::error("AUTH.UNAUTHORIZED", "unauthorized");
    assert!(!response.success);
    assert!(response.data.is_none());
    assert!(response.error.is_some());
    assert_eq!(response.message.as_deref(), Some("unauthorized"));
}

#[test]
fn success_message_is_serialized() {
    let response = ApiResponse::success_with_message(1, "change submitted for approval");
    let value = serde_json::to_value(response).expect("serialize");
    assert_eq!(value["success"], true);
    assert_eq!(value["message"], "change submitted for approval");

    let value = serde_json::to_value(ApiResponse::success(1)).expect("serialize");
    assert!(value.get("message").is_none());
}
