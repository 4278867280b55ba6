//! Request builders, one per remote Cobbler method.
//!
//! Each function is pure: it takes the operation's arguments plus the session
//! token and returns the `MethodCall` to send. Parameter order is positional
//! on the server side and must not change.

use crate::types::NetworkConfig;
use crate::xmlrpc::{MethodCall, Value};

pub const KICKSTART_DIR: &str = "/var/lib/cobbler/kickstarts/";
pub const SNIPPET_DIR: &str = "/var/lib/cobbler/snippets/";

/// Marker the server interprets as "delete this template".
const DELETE_MARKER: i32 = -1;

pub fn kickstart_path(name: &str) -> String {
    format!("{KICKSTART_DIR}{name}.ks")
}

pub fn snippet_path(name: &str) -> String {
    format!("{SNIPPET_DIR}{name}")
}

pub fn login(user: &str, pass: &str) -> MethodCall {
    MethodCall::new("login", vec![user.into(), pass.into()])
}

pub fn new_system(token: &str) -> MethodCall {
    MethodCall::new("new_system", vec![token.into()])
}

pub fn save_system(id: &str, token: &str) -> MethodCall {
    MethodCall::new("save_system", vec![id.into(), token.into()])
}

/// Generic "set field" call. `id` is the handle returned by `new_system`,
/// `field` names the attribute, `value` is its field-specific payload.
pub fn modify_system(id: &str, field: &str, value: Value, token: &str) -> MethodCall {
    MethodCall::new("modify_system", vec![id.into(), field.into(), value, token.into()])
}

pub fn set_system_name(id: &str, name: &str, token: &str) -> MethodCall {
    modify_system(id, "name", name.into(), token)
}

pub fn set_system_profile(id: &str, profile: &str, token: &str) -> MethodCall {
    modify_system(id, "profile", profile.into(), token)
}

pub fn set_system_hostname(id: &str, hostname: &str, token: &str) -> MethodCall {
    modify_system(id, "hostname", hostname.into(), token)
}

pub fn set_system_nameservers(id: &str, nameservers: &str, token: &str) -> MethodCall {
    modify_system(id, "name_servers", nameservers.into(), token)
}

pub fn set_system_network(id: &str, config: &NetworkConfig, token: &str) -> MethodCall {
    modify_system(id, "modify_interface", config.to_value(), token)
}

pub fn sync(token: &str) -> MethodCall {
    MethodCall::new("sync", vec![token.into()])
}

pub fn remove_system(name: &str, token: &str) -> MethodCall {
    MethodCall::new("remove_system", vec![name.into(), token.into()])
}

pub fn write_kickstart_file(name: &str, body: &str, token: &str) -> MethodCall {
    kickstart_call(name, false, body.into(), token)
}

pub fn read_kickstart_file(name: &str, token: &str) -> MethodCall {
    kickstart_call(name, true, "".into(), token)
}

pub fn delete_kickstart_file(name: &str, token: &str) -> MethodCall {
    kickstart_call(name, false, DELETE_MARKER.into(), token)
}

pub fn write_snippet(name: &str, body: &str, token: &str) -> MethodCall {
    snippet_call(name, false, body.into(), token)
}

pub fn read_snippet(name: &str, token: &str) -> MethodCall {
    snippet_call(name, true, "".into(), token)
}

pub fn delete_snippet(name: &str, token: &str) -> MethodCall {
    snippet_call(name, false, DELETE_MARKER.into(), token)
}

fn kickstart_call(name: &str, is_read: bool, data: Value, token: &str) -> MethodCall {
    MethodCall::new(
        "read_or_write_kickstart_template",
        vec![kickstart_path(name).into(), is_read.into(), data, token.into()],
    )
}

fn snippet_call(name: &str, is_read: bool, data: Value, token: &str) -> MethodCall {
    MethodCall::new(
        "read_or_write_snippet",
        vec![snippet_path(name).into(), is_read.into(), data, token.into()],
    )
}
