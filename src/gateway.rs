//! Transport-neutral request gateway.
//!
//! An HTTP handler (serverless function, axum route, ...) passes the provider and the raw JSON
//! body to [`Gateway::handle`] and writes the returned [`Reply`] back with its status. CORS
//! headers and method routing stay with the handler; [`Reply::preflight`] covers `OPTIONS`.
//!
//! Bodies carry an `action` discriminator:
//!
//! | provider | action          | fields                                               |
//! |----------|-----------------|------------------------------------------------------|
//! | garmin   | `requestToken`  |                                                      |
//! | garmin   | `accessToken`   | `oauthToken`, `oauthVerifier`, `tokenSecret`         |
//! | garmin   | `sync`          | `accessToken`, `accessSecret`, `startDate`, `endDate` |
//! | whoop    | `getAuthUrl`    |                                                      |
//! | whoop    | `exchangeToken` | `code`                                               |
//! | whoop    | `refreshToken`  | `refreshToken`                                       |
//! | whoop    | `sync`          | `accessToken`, `startDate`, `endDate`                |
//!
//! A body without `action` that carries `accessToken` is a `sync`.

// crates.io
use serde_json::{Map, Value, json};
// self
use crate::{
	_prelude::*,
	auth::{AccessCredential, BearerCredential, TokenPair},
	error::{ConfigError, InputError},
	flows::Broker,
	http::ProviderHttpClient,
	oauth::TransportErrorMapper,
	provider::ProviderKind,
	sync::{AggregationResult, DateBound, DateRange},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Gateway specialized for the crate's default reqwest transport stack.
pub type ReqwestGateway = Gateway<ReqwestHttpClient, ReqwestTransportErrorMapper>;

const GARMIN_ACTIONS: [&str; 3] = ["requestToken", "accessToken", "sync"];
const WHOOP_ACTIONS: [&str; 4] = ["getAuthUrl", "exchangeToken", "refreshToken", "sync"];

/// Status plus JSON body to send back to the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct Reply {
	/// HTTP status code.
	pub status: u16,
	/// JSON body; `None` for an empty body.
	pub body: Option<Value>,
}
impl Reply {
	/// Empty `200` for CORS preflight requests.
	pub fn preflight() -> Self {
		Self { status: 200, body: None }
	}

	/// `200` with `"success": true` merged into `fields`.
	pub fn success(mut fields: Map<String, Value>) -> Self {
		fields.insert("success".into(), Value::Bool(true));

		Self { status: 200, body: Some(Value::Object(fields)) }
	}

	/// `{"error": message}` with the status mirrored from the error class.
	pub fn failure(err: &Error) -> Self {
		Self { status: err.status_code(), body: Some(json!({ "error": err.to_string() })) }
	}

	/// Serialized body; empty for preflight replies.
	pub fn body_text(&self) -> String {
		self.body.as_ref().map(Value::to_string).unwrap_or_default()
	}
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
enum GarminOperation {
	RequestToken,
	AccessToken {
		#[serde(default)]
		oauth_token: Option<String>,
		#[serde(default)]
		oauth_verifier: Option<String>,
		#[serde(default)]
		token_secret: Option<String>,
	},
	Sync {
		#[serde(default)]
		access_token: Option<String>,
		#[serde(default)]
		access_secret: Option<String>,
		#[serde(default)]
		start_date: Option<DateBound>,
		#[serde(default)]
		end_date: Option<DateBound>,
	},
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
enum WhoopOperation {
	GetAuthUrl,
	ExchangeToken {
		#[serde(default)]
		code: Option<String>,
	},
	RefreshToken {
		#[serde(default)]
		refresh_token: Option<String>,
	},
	Sync {
		#[serde(default)]
		access_token: Option<String>,
		#[serde(default)]
		start_date: Option<DateBound>,
		#[serde(default)]
		end_date: Option<DateBound>,
	},
}

/// Routes parsed operations to the Garmin and WHOOP brokers.
#[derive(Debug)]
pub struct Gateway<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	garmin: Broker<C, M>,
	whoop: Broker<C, M>,
}
impl<C, M> Gateway<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a gateway from one broker per provider.
	pub fn new(garmin: Broker<C, M>, whoop: Broker<C, M>) -> Self {
		Self { garmin, whoop }
	}

	/// Broker serving `provider`.
	pub fn broker(&self, provider: ProviderKind) -> &Broker<C, M> {
		match provider {
			ProviderKind::Garmin => &self.garmin,
			ProviderKind::Whoop => &self.whoop,
		}
	}

	/// Parses `body`, runs the operation, and renders the reply. Never fails: every error is
	/// folded into a `400` or `500` reply.
	pub async fn handle(&self, provider: ProviderKind, body: &str) -> Reply {
		let outcome = match provider {
			ProviderKind::Garmin => match parse_operation(body, &GARMIN_ACTIONS) {
				Ok(op) => self.handle_garmin(op).await,
				Err(err) => Err(err),
			},
			ProviderKind::Whoop => match parse_operation(body, &WHOOP_ACTIONS) {
				Ok(op) => self.handle_whoop(op).await,
				Err(err) => Err(err),
			},
		};

		match outcome {
			Ok(fields) => Reply::success(fields),
			Err(err) => Reply::failure(&err),
		}
	}

	async fn handle_garmin(&self, op: GarminOperation) -> Result<Map<String, Value>> {
		let broker = &self.garmin;

		match op {
			GarminOperation::RequestToken => {
				let request = broker.request_token().await?;
				let auth_url = broker.authorization_url(&request.token);

				Ok(fields([
					("token", Value::from(request.token)),
					("tokenSecret", Value::from(request.token_secret.expose())),
					("authUrl", Value::from(auth_url.as_str())),
				]))
			},
			GarminOperation::AccessToken { oauth_token, oauth_verifier, token_secret } => {
				let oauth_token = required("oauthToken", oauth_token)?;
				let oauth_verifier = required("oauthVerifier", oauth_verifier)?;
				let token_secret = required("tokenSecret", token_secret)?;
				let pair =
					broker.exchange_access_token(&oauth_token, &oauth_verifier, &token_secret).await?;

				Ok(fields([
					("accessToken", Value::from(pair.token.expose())),
					("accessSecret", Value::from(pair.token_secret.expose())),
				]))
			},
			GarminOperation::Sync { access_token, access_secret, start_date, end_date } => {
				let credential = AccessCredential::from(TokenPair::new(
					required("accessToken", access_token)?,
					required("accessSecret", access_secret)?,
				));
				let range = date_range(start_date, end_date)?;

				sync_fields(broker.aggregate_all(&credential, &range).await?)
			},
		}
	}

	async fn handle_whoop(&self, op: WhoopOperation) -> Result<Map<String, Value>> {
		let broker = &self.whoop;

		match op {
			WhoopOperation::GetAuthUrl => {
				let auth_url = broker.authorization_code_url(None)?;

				Ok(fields([("authUrl", Value::from(auth_url.as_str()))]))
			},
			WhoopOperation::ExchangeToken { code } => {
				let credential = broker.exchange_code(&required("code", code)?).await?;

				Ok(bearer_fields(&credential))
			},
			WhoopOperation::RefreshToken { refresh_token } => {
				let credential =
					broker.refresh(&required("refreshToken", refresh_token)?).await?;

				Ok(bearer_fields(&credential))
			},
			WhoopOperation::Sync { access_token, start_date, end_date } => {
				let credential = AccessCredential::from(BearerCredential::from_access_token(
					required("accessToken", access_token)?,
				));
				let range = date_range(start_date, end_date)?;

				sync_fields(broker.aggregate_all(&credential, &range).await?)
			},
		}
	}
}

fn parse_operation<T>(body: &str, actions: &[&str]) -> Result<T>
where
	T: for<'de> Deserialize<'de>,
{
	let body = if body.trim().is_empty() { "{}" } else { body };
	let mut value: Value = serde_json::from_str(body)
		.map_err(|e| InputError::MalformedBody { reason: e.to_string() })?;

	if let Some(object) = value.as_object_mut() {
		// Dedicated sync endpoints post their credentials without an action.
		if object.get("action").is_none_or(Value::is_null) && object.contains_key("accessToken") {
			object.insert("action".into(), Value::from("sync"));
		}
	}

	let action = match value.get("action") {
		None | Some(Value::Null) => return Err(InputError::MissingField { field: "action" }.into()),
		Some(Value::String(action)) => action.clone(),
		Some(other) => other.to_string(),
	};

	if !actions.contains(&action.as_str()) {
		return Err(InputError::UnknownOperation { action }.into());
	}

	serde_path_to_error::deserialize(value).map_err(|e| {
		InputError::MalformedBody { reason: format!("{} at `{}`", e.inner(), e.path()) }.into()
	})
}

fn required(field: &'static str, value: Option<String>) -> Result<String> {
	value
		.filter(|value| !value.trim().is_empty())
		.ok_or_else(|| InputError::MissingField { field }.into())
}

fn date_range(start: Option<DateBound>, end: Option<DateBound>) -> Result<DateRange> {
	let start = start.ok_or(InputError::MissingField { field: "startDate" })?;
	let end = end.ok_or(InputError::MissingField { field: "endDate" })?;

	DateRange::parse(&start, &end)
}

fn fields<const N: usize>(entries: [(&str, Value); N]) -> Map<String, Value> {
	entries.into_iter().map(|(key, value)| (key.to_owned(), value)).collect()
}

fn bearer_fields(credential: &BearerCredential) -> Map<String, Value> {
	fields([
		("accessToken", Value::from(credential.access_token.expose())),
		(
			"refreshToken",
			credential
				.refresh_token
				.as_ref()
				.map_or(Value::Null, |token| Value::from(token.expose())),
		),
		("expiresIn", Value::from(credential.expires_in())),
	])
}

fn sync_fields(result: AggregationResult) -> Result<Map<String, Value>> {
	match serde_json::to_value(&result) {
		Ok(Value::Object(mut map)) => {
			map.remove("provider");

			Ok(map)
		},
		Ok(_) => Ok(Map::new()),
		Err(source) => Err(ConfigError::Render { source }.into()),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn preflight_is_empty_ok() {
		let reply = Reply::preflight();

		assert_eq!(reply.status, 200);
		assert_eq!(reply.body_text(), "");
	}

	#[test]
	fn operations_parse_with_wire_names() {
		let op: GarminOperation = parse_operation(
			r#"{"action":"accessToken","oauthToken":"t","oauthVerifier":"v","tokenSecret":"s"}"#,
			&GARMIN_ACTIONS,
		)
		.expect("Access token operation should parse.");

		assert!(matches!(
			op,
			GarminOperation::AccessToken { oauth_token: Some(ref t), .. } if t == "t"
		));

		let op: WhoopOperation =
			parse_operation(r#"{"action":"sync","accessToken":"a","startDate":1,"endDate":"2"}"#, &WHOOP_ACTIONS)
				.expect("Sync operation should parse.");

		assert!(matches!(op, WhoopOperation::Sync { start_date: Some(DateBound::Unix(1)), .. }));
	}

	#[test]
	fn unknown_missing_and_malformed_actions_are_input_errors() {
		assert!(matches!(
			parse_operation::<WhoopOperation>(r#"{"action":"requestToken"}"#, &WHOOP_ACTIONS),
			Err(Error::Input(InputError::UnknownOperation { .. }))
		));
		assert!(matches!(
			parse_operation::<WhoopOperation>("", &WHOOP_ACTIONS),
			Err(Error::Input(InputError::MissingField { field: "action" }))
		));
		assert!(matches!(
			parse_operation::<GarminOperation>(r#"{"startDate":"2023-11-14"}"#, &GARMIN_ACTIONS),
			Err(Error::Input(InputError::MissingField { field: "action" }))
		));
		assert!(matches!(
			parse_operation::<GarminOperation>("{not json", &GARMIN_ACTIONS),
			Err(Error::Input(InputError::MalformedBody { .. }))
		));
		assert!(matches!(
			parse_operation::<WhoopOperation>(r#"{"action":"exchangeToken","code":7}"#, &WHOOP_ACTIONS),
			Err(Error::Input(InputError::MalformedBody { .. }))
		));
	}

	#[test]
	fn credentials_without_action_select_sync() {
		let operation = parse_operation::<WhoopOperation>(
			r#"{"accessToken":"at-1","startDate":"2023-11-14","endDate":"2023-11-15"}"#,
			&WHOOP_ACTIONS,
		)
		.expect("Action-less sync body should parse.");

		assert!(matches!(operation, WhoopOperation::Sync { .. }));
		assert!(matches!(
			parse_operation::<GarminOperation>(
				r#"{"action":null,"accessToken":"t","accessSecret":"s"}"#,
				&GARMIN_ACTIONS
			),
			Ok(GarminOperation::Sync { .. })
		));
	}

	#[test]
	fn failure_reply_mirrors_status() {
		let reply = Reply::failure(&InputError::MissingField { field: "code" }.into());

		assert_eq!(reply.status, 400);
		assert_eq!(reply.body, Some(json!({ "error": "Missing required field `code`." })));
	}
}
