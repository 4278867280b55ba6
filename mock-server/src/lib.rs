use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use cobbler_core::request::{KICKSTART_DIR, SNIPPET_DIR};
use cobbler_core::{MethodCall, MethodResponse, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

pub const ENDPOINT: &str = "/cobbler_api";

/// Fault code Cobbler uses for every `CX` exception.
const FAULT_CODE: i32 = 1;

/// A system record as the mock stores it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SystemRecord {
    pub name: String,
    pub profile: String,
    pub hostname: String,
    pub name_servers: String,
    pub interfaces: BTreeMap<String, String>,
}

/// In-memory stand-in for a Cobbler server.
#[derive(Debug, Default)]
pub struct Cobbler {
    username: String,
    password: String,
    tokens: HashSet<String>,
    /// Records from `new_system` not yet saved. `save_system` evicts its
    /// handle; handles that are never saved stay until the mock shuts down.
    staged: HashMap<String, SystemRecord>,
    pub systems: BTreeMap<String, SystemRecord>,
    pub kickstarts: BTreeMap<String, String>,
    pub snippets: BTreeMap<String, String>,
    pub syncs: u32,
}

type Outcome = Result<Value, String>;

impl Cobbler {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            ..Self::default()
        }
    }

    pub fn dispatch(&mut self, call: &MethodCall) -> MethodResponse {
        let params = call.params.as_slice();
        let outcome = match call.method_name.as_str() {
            "login" => self.login(params),
            "new_system" => self.new_system(params),
            "modify_system" => self.modify_system(params),
            "save_system" => self.save_system(params),
            "remove_system" => self.remove_system(params),
            "sync" => self.sync(params),
            "read_or_write_kickstart_template" => {
                self.check_token(params, 3)
                    .and_then(|()| template_op(&mut self.kickstarts, KICKSTART_DIR, params))
            }
            "read_or_write_snippet" => {
                self.check_token(params, 3)
                    .and_then(|()| template_op(&mut self.snippets, SNIPPET_DIR, params))
            }
            other => Err(format!("unknown remote method '{other}'")),
        };
        match outcome {
            Ok(value) => MethodResponse::Success(value),
            Err(message) => {
                debug!(method = %call.method_name, %message, "answering with fault");
                MethodResponse::Fault {
                    code: FAULT_CODE,
                    message,
                }
            }
        }
    }

    fn check_token(&self, params: &[Value], idx: usize) -> Result<(), String> {
        let token = string_arg(params, idx)?;
        if self.tokens.contains(token) {
            Ok(())
        } else {
            Err(format!("invalid token: {token}"))
        }
    }

    fn login(&mut self, params: &[Value]) -> Outcome {
        let user = string_arg(params, 0)?;
        let pass = string_arg(params, 1)?;
        if user != self.username || pass != self.password {
            return Err(format!("login failed ({user})"));
        }
        let token = Uuid::new_v4().simple().to_string();
        self.tokens.insert(token.clone());
        Ok(Value::String(token))
    }

    fn new_system(&mut self, params: &[Value]) -> Outcome {
        self.check_token(params, 0)?;
        let handle = format!("___NEW___system::{}", Uuid::new_v4().simple());
        self.staged.insert(handle.clone(), SystemRecord::default());
        Ok(Value::String(handle))
    }

    fn modify_system(&mut self, params: &[Value]) -> Outcome {
        self.check_token(params, 3)?;
        let id = string_arg(params, 0)?;
        let field = string_arg(params, 1)?;
        let value = params.get(2).ok_or("missing argument 2")?;
        let record = self
            .staged
            .get_mut(id)
            .ok_or_else(|| format!("unknown system handle: {id}"))?;

        match field {
            "name" => record.name = string_value(value)?,
            "profile" => record.profile = string_value(value)?,
            "hostname" => record.hostname = string_value(value)?,
            "name_servers" => record.name_servers = string_value(value)?,
            "modify_interface" => {
                let Value::Struct(members) = value else {
                    return Err("modify_interface expects a struct".to_string());
                };
                for (key, member) in members {
                    record.interfaces.insert(key.clone(), string_value(member)?);
                }
            }
            other => return Err(format!("unknown field '{other}'")),
        }
        Ok(Value::Boolean(true))
    }

    fn save_system(&mut self, params: &[Value]) -> Outcome {
        self.check_token(params, 1)?;
        let id = string_arg(params, 0)?;
        let name = match self.staged.get(id) {
            Some(record) if record.name.is_empty() => return Err("system name is required".to_string()),
            Some(record) => record.name.clone(),
            None => return Err(format!("unknown system handle: {id}")),
        };
        if let Some(record) = self.staged.remove(id) {
            self.systems.insert(name, record);
        }
        Ok(Value::Boolean(true))
    }

    fn remove_system(&mut self, params: &[Value]) -> Outcome {
        self.check_token(params, 1)?;
        let name = string_arg(params, 0)?;
        match self.systems.remove(name) {
            Some(_) => Ok(Value::Boolean(true)),
            None => Err(format!("system not found: {name}")),
        }
    }

    fn sync(&mut self, params: &[Value]) -> Outcome {
        self.check_token(params, 0)?;
        self.syncs += 1;
        Ok(Value::Boolean(true))
    }
}

/// Shared read/write/delete logic for kickstart templates and snippets.
/// Params are `[path, is_read, data, token]`; the token is checked by the caller.
fn template_op(files: &mut BTreeMap<String, String>, prefix: &str, params: &[Value]) -> Outcome {
    let path = string_arg(params, 0)?;
    if !path.starts_with(prefix) {
        return Err(format!("unable to access file outside of {prefix}: {path}"));
    }
    let is_read = params
        .get(1)
        .and_then(Value::as_bool)
        .ok_or("argument 1 must be a boolean")?;
    if is_read {
        return files
            .get(path)
            .cloned()
            .map(Value::String)
            .ok_or_else(|| format!("no such file: {path}"));
    }
    match params.get(2) {
        Some(Value::Int(-1)) => files
            .remove(path)
            .map(|_| Value::Boolean(true))
            .ok_or_else(|| format!("no such file: {path}")),
        Some(Value::String(body)) => {
            files.insert(path.to_string(), body.clone());
            Ok(Value::Boolean(true))
        }
        _ => Err("argument 2 must be a string or -1".to_string()),
    }
}

fn string_arg(params: &[Value], idx: usize) -> Result<&str, String> {
    match params.get(idx) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(format!("argument {idx} must be a string")),
        None => Err(format!("missing argument {idx}")),
    }
}

fn string_value(value: &Value) -> Result<String, String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| "expected a string value".to_string())
}

pub type Db = Arc<RwLock<Cobbler>>;

/// Router with the default `cobbler`/`cobbler` account.
pub fn app() -> Router {
    router(Arc::new(RwLock::new(Cobbler::new("cobbler", "cobbler"))))
}

pub fn router(db: Db) -> Router {
    Router::new().route(ENDPOINT, post(xmlrpc)).with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn xmlrpc(State(db): State<Db>, body: String) -> Response {
    let call = match MethodCall::parse(&body) {
        Ok(call) => call,
        Err(err) => {
            warn!(%err, "undecodable request");
            return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
        }
    };
    let reply = db.write().await.dispatch(&call);
    ([(header::CONTENT_TYPE, "text/xml")], reply.to_xml()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cobbler_core::request;
    use cobbler_core::NetworkConfig;

    fn login(cobbler: &mut Cobbler) -> String {
        match cobbler.dispatch(&request::login("cobbler", "cobbler")) {
            MethodResponse::Success(Value::String(token)) => token,
            other => panic!("login failed: {other:?}"),
        }
    }

    fn expect_fault(response: MethodResponse) -> String {
        match response {
            MethodResponse::Fault { code, message } => {
                assert_eq!(code, FAULT_CODE);
                message
            }
            other => panic!("expected fault, got {other:?}"),
        }
    }

    fn expect_true(response: MethodResponse) {
        assert_eq!(response, MethodResponse::Success(Value::Boolean(true)));
    }

    #[test]
    fn login_rejects_bad_password() {
        let mut cobbler = Cobbler::new("cobbler", "cobbler");
        let message = expect_fault(cobbler.dispatch(&request::login("cobbler", "wrong")));
        assert!(message.contains("login failed"));
    }

    #[test]
    fn calls_require_issued_token() {
        let mut cobbler = Cobbler::new("cobbler", "cobbler");
        let message = expect_fault(cobbler.dispatch(&request::sync("forged")));
        assert!(message.contains("invalid token"));
        assert_eq!(cobbler.syncs, 0);
    }

    #[test]
    fn system_is_stored_by_name_on_save() {
        let mut cobbler = Cobbler::new("cobbler", "cobbler");
        let token = login(&mut cobbler);
        let handle = match cobbler.dispatch(&request::new_system(&token)) {
            MethodResponse::Success(Value::String(h)) => h,
            other => panic!("{other:?}"),
        };
        expect_true(cobbler.dispatch(&request::set_system_name(&handle, "web1", &token)));
        expect_true(cobbler.dispatch(&request::set_system_hostname(&handle, "web1.lan", &token)));
        let network = NetworkConfig {
            mac: "aa:bb:cc:dd:ee:ff".to_string(),
            ..NetworkConfig::default()
        };
        expect_true(cobbler.dispatch(&request::set_system_network(&handle, &network, &token)));
        expect_true(cobbler.dispatch(&request::save_system(&handle, &token)));

        let record = &cobbler.systems["web1"];
        assert_eq!(record.hostname, "web1.lan");
        assert_eq!(record.interfaces["macaddress-eth0"], "aa:bb:cc:dd:ee:ff");

        // The handle is consumed by the save.
        assert!(cobbler.staged.is_empty());
        expect_fault(cobbler.dispatch(&request::save_system(&handle, &token)));
    }

    #[test]
    fn save_without_name_is_refused() {
        let mut cobbler = Cobbler::new("cobbler", "cobbler");
        let token = login(&mut cobbler);
        let MethodResponse::Success(Value::String(handle)) = cobbler.dispatch(&request::new_system(&token)) else {
            panic!("new_system failed");
        };
        let message = expect_fault(cobbler.dispatch(&request::save_system(&handle, &token)));
        assert!(message.contains("name is required"));
        assert!(cobbler.systems.is_empty());
    }

    #[test]
    fn unknown_field_is_refused() {
        let mut cobbler = Cobbler::new("cobbler", "cobbler");
        let token = login(&mut cobbler);
        let MethodResponse::Success(Value::String(handle)) = cobbler.dispatch(&request::new_system(&token)) else {
            panic!("new_system failed");
        };
        let call = request::modify_system(&handle, "owners", Value::from("me"), &token);
        assert!(expect_fault(cobbler.dispatch(&call)).contains("owners"));
    }

    #[test]
    fn snippet_write_read_delete() {
        let mut cobbler = Cobbler::new("cobbler", "cobbler");
        let token = login(&mut cobbler);
        expect_true(cobbler.dispatch(&request::write_snippet("net", "# net", &token)));
        assert_eq!(cobbler.snippets["/var/lib/cobbler/snippets/net"], "# net");
        assert_eq!(
            cobbler.dispatch(&request::read_snippet("net", &token)),
            MethodResponse::Success(Value::from("# net"))
        );
        expect_true(cobbler.dispatch(&request::delete_snippet("net", &token)));
        expect_fault(cobbler.dispatch(&request::read_snippet("net", &token)));
    }

    #[test]
    fn template_path_must_stay_under_prefix() {
        let mut cobbler = Cobbler::new("cobbler", "cobbler");
        let token = login(&mut cobbler);
        let call = MethodCall::new(
            "read_or_write_kickstart_template",
            vec![
                Value::from("/etc/passwd"),
                Value::Boolean(true),
                Value::from(""),
                Value::from(token.as_str()),
            ],
        );
        assert!(expect_fault(cobbler.dispatch(&call)).contains("outside"));
    }

    #[test]
    fn unknown_method_is_fault() {
        let mut cobbler = Cobbler::new("cobbler", "cobbler");
        let message = expect_fault(cobbler.dispatch(&MethodCall::new("power_system", Vec::new())));
        assert!(message.contains("power_system"));
    }
}
