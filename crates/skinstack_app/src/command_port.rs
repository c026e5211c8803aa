// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene host backed by a DCC command port.
//!
//! Each request is one Python expression terminated by a newline. The
//! expression is wrapped in `json.dumps(...)` so replies can be decoded with
//! `serde_json`; the port terminates every reply with a NUL byte. A reply
//! that is not JSON is the host's error text.

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use skinstack_graph::{Directions, HostError, KindTable, NodeKind, NodeName, SceneHost};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;

const CMDS: &str = "__import__('maya.cmds', fromlist=['cmds'])";
const MGLOBAL: &str = "__import__('maya.api.OpenMaya', fromlist=['MGlobal']).MGlobal";

/// Scene host talking to a running DCC over TCP
pub struct CommandPortHost {
    address: String,
    writer: Mutex<TcpStream>,
    reader: Mutex<BufReader<TcpStream>>,
    kinds: KindTable,
}

impl CommandPortHost {
    /// Connect to the command port at `address`
    pub fn connect(address: &str, kinds: KindTable) -> Result<Self, HostError> {
        let stream = TcpStream::connect(address).map_err(transport)?;
        let reader = stream.try_clone().map_err(transport)?;
        tracing::info!("Connected to command port {address}");
        Ok(Self {
            address: address.to_string(),
            writer: Mutex::new(stream),
            reader: Mutex::new(BufReader::new(reader)),
            kinds,
        })
    }

    /// Address of the command port
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Send one expression and return the raw reply
    fn send(&self, expression: &str) -> Result<String, HostError> {
        let mut writer = self.writer.lock();
        let mut reader = self.reader.lock();

        tracing::trace!("-> {expression}");
        writer.write_all(expression.as_bytes()).map_err(transport)?;
        writer.write_all(b"\n").map_err(transport)?;
        writer.flush().map_err(transport)?;

        let mut buf = Vec::new();
        if reader.read_until(0, &mut buf).map_err(transport)? == 0 {
            return Err(HostError::Transport(format!(
                "{} closed the connection",
                self.address
            )));
        }
        if buf.last() == Some(&0) {
            buf.pop();
        }
        let reply = String::from_utf8(buf)
            .map_err(|e| HostError::Protocol(format!("reply is not UTF-8: {e}")))?;
        tracing::trace!("<- {reply}");
        Ok(reply.trim().to_string())
    }

    /// Evaluate an expression and decode its JSON result
    fn eval<T: DeserializeOwned>(&self, expression: &str) -> Result<T, HostError> {
        let reply = self.send(&json_dumps(expression))?;
        serde_json::from_str(&reply).map_err(|_| HostError::Protocol(reply))
    }

    /// (own plug, other plug) pairs on one side of `name`
    fn connection_pairs(
        &self,
        name: &NodeName,
        upstream: bool,
        shapes_only: bool,
    ) -> Result<Vec<(String, String)>, HostError> {
        let expression = format!(
            "{CMDS}.listConnections({}, connections=True, plugs=True, source={}, destination={}, shapes={}) or []",
            py_str(name.as_str()),
            py_bool(upstream),
            py_bool(!upstream),
            py_bool(shapes_only),
        );
        let flat: Vec<String> = self.eval(&expression)?;
        if flat.len() % 2 != 0 {
            return Err(HostError::Protocol(format!(
                "odd connection list for {name}: {flat:?}"
            )));
        }
        Ok(flat
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect())
    }

    fn display(&self, function: &str, message: &str) {
        let expression = format!("{MGLOBAL}.{function}({})", py_str(message));
        if let Err(err) = self.send(&json_dumps(&expression)) {
            tracing::warn!("Could not show message on {}: {err}", self.address);
        }
    }
}

impl SceneHost for CommandPortHost {
    fn node_exists(&self, name: &NodeName) -> Result<bool, HostError> {
        self.eval(&format!("{CMDS}.objExists({})", py_str(name.as_str())))
    }

    fn node_kind(&self, name: &NodeName) -> Result<NodeKind, HostError> {
        if !self.node_exists(name)? {
            return Err(HostError::NodeNotFound(name.clone()));
        }
        let type_name: String =
            self.eval(&format!("{CMDS}.objectType({})", py_str(name.as_str())))?;
        Ok(self.kinds.kind_of(&type_name))
    }

    fn list_connections(
        &self,
        name: &NodeName,
        directions: Directions,
        shapes_only: bool,
    ) -> Result<Vec<String>, HostError> {
        tracing::debug!("Listing {directions:?} connections of {name}");
        let mut flat = Vec::new();
        if directions.includes_upstream() {
            for (own, other) in self.connection_pairs(name, true, shapes_only)? {
                flat.push(other);
                flat.push(own);
            }
        }
        if directions.includes_downstream() {
            for (own, other) in self.connection_pairs(name, false, shapes_only)? {
                // self-connections were already listed upstream
                if directions.includes_upstream() && plug_node(&other) == name.as_str() {
                    continue;
                }
                flat.push(own);
                flat.push(other);
            }
        }
        Ok(flat)
    }

    fn connect(&mut self, from: &str, to: &str, force: bool) -> Result<(), HostError> {
        let expression = format!(
            "{CMDS}.connectAttr({}, {}, force={})",
            py_str(from),
            py_str(to),
            py_bool(force)
        );
        let reply = self.send(&json_dumps(&expression))?;
        if serde_json::from_str::<serde_json::Value>(&reply).is_err() {
            return Err(HostError::ConnectRejected {
                from: from.to_string(),
                to: to.to_string(),
                reason: reply,
            });
        }
        tracing::info!("Connected {from} -> {to}");
        Ok(())
    }

    fn duplicate(&mut self, node: &NodeName, new_name: &str) -> Result<NodeName, HostError> {
        let expression = format!(
            "{CMDS}.duplicate({}, name={})",
            py_str(node.as_str()),
            py_str(new_name)
        );
        let failed = |reason: String| HostError::DuplicateFailed {
            node: node.clone(),
            reason,
        };
        let created: Vec<String> = self.eval(&expression).map_err(|e| match e {
            HostError::Protocol(reply) => failed(reply),
            other => other,
        })?;
        let first = created
            .into_iter()
            .next()
            .ok_or_else(|| failed("no node created".to_string()))?;
        tracing::info!("Duplicated {node} as {first}");
        Ok(NodeName::new(first))
    }

    fn display_info(&self, message: &str) {
        self.display("displayInfo", message);
    }

    fn display_error(&self, message: &str) {
        self.display("displayError", message);
    }
}

fn transport(err: std::io::Error) -> HostError {
    HostError::Transport(err.to_string())
}

fn json_dumps(expression: &str) -> String {
    format!("__import__('json').dumps({expression})")
}

/// Python string literal; JSON string syntax is valid Python
fn py_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn py_bool(b: bool) -> &'static str {
    if b {
        "True"
    } else {
        "False"
    }
}

fn plug_node(path: &str) -> &str {
    path.split('.').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::sync::Arc;
    use std::thread::JoinHandle;

    /// Fake command port answering each request with the next canned reply
    fn serve(replies: Vec<&'static str>) -> (String, Arc<Mutex<Vec<String>>>, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requests);

        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut writer = stream.try_clone().unwrap();
            let mut reader = BufReader::new(stream);
            for reply in replies {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 {
                    break;
                }
                log.lock().push(line.trim_end().to_string());
                writer.write_all(reply.as_bytes()).unwrap();
                writer.write_all(b"\n\0").unwrap();
            }
        });
        (address, requests, handle)
    }

    #[test]
    fn test_list_connections_in_source_destination_order() {
        let (address, requests, handle) = serve(vec![
            r#"["skinB.input[0].inputGeometry", "meshOrig.worldMesh[0]"]"#,
            r#"["skinB.outputGeometry[0]", "body.inMesh"]"#,
        ]);
        let host = CommandPortHost::connect(&address, KindTable::default()).unwrap();

        let flat = host
            .list_connections(&NodeName::from("skinB"), Directions::Both, true)
            .unwrap();
        handle.join().unwrap();

        assert_eq!(
            flat,
            vec![
                "meshOrig.worldMesh[0]",
                "skinB.input[0].inputGeometry",
                "skinB.outputGeometry[0]",
                "body.inMesh",
            ]
        );
        let requests = requests.lock();
        assert!(requests[0].starts_with("__import__('json').dumps("));
        assert!(requests[0].contains("source=True, destination=False, shapes=True"));
        assert!(requests[1].contains("source=False, destination=True"));
    }

    #[test]
    fn test_node_kind_uses_kind_table() {
        let (address, _, handle) = serve(vec!["true", "\"skinCluster\"", "true", "\"joint\""]);
        let host = CommandPortHost::connect(&address, KindTable::default()).unwrap();

        assert_eq!(
            host.node_kind(&NodeName::from("skinA")).unwrap(),
            NodeKind::Deformer
        );
        assert_eq!(
            host.node_kind(&NodeName::from("joint1")).unwrap(),
            NodeKind::Unknown
        );
        handle.join().unwrap();
    }

    #[test]
    fn test_missing_node() {
        let (address, _, handle) = serve(vec!["false"]);
        let host = CommandPortHost::connect(&address, KindTable::default()).unwrap();
        assert_eq!(
            host.node_kind(&NodeName::from("ghost")),
            Err(HostError::NodeNotFound(NodeName::from("ghost")))
        );
        handle.join().unwrap();
    }

    #[test]
    fn test_connect_and_rejection() {
        let (address, requests, handle) = serve(vec![
            "null",
            "# Error: The destination attribute 'meshX.inMesh' is locked.",
        ]);
        let mut host = CommandPortHost::connect(&address, KindTable::default()).unwrap();

        host.connect("skinD.outputGeometry[0]", "meshX.inMesh", true)
            .unwrap();
        let err = host
            .connect("skinD.outputGeometry[0]", "meshX.inMesh", true)
            .unwrap_err();
        handle.join().unwrap();

        assert!(matches!(err, HostError::ConnectRejected { ref reason, .. } if reason.contains("locked")));
        assert!(requests.lock()[0]
            .contains("connectAttr(\"skinD.outputGeometry[0]\", \"meshX.inMesh\", force=True)"));
    }

    #[test]
    fn test_duplicate() {
        let (address, _, handle) = serve(vec![r#"["meshXRebuilt"]"#, "[]"]);
        let mut host = CommandPortHost::connect(&address, KindTable::default()).unwrap();

        let created = host
            .duplicate(&NodeName::from("meshX"), "meshXRebuilt")
            .unwrap();
        assert_eq!(created, NodeName::from("meshXRebuilt"));
        assert!(matches!(
            host.duplicate(&NodeName::from("meshX"), "meshXRebuilt"),
            Err(HostError::DuplicateFailed { .. })
        ));
        handle.join().unwrap();
    }

    #[test]
    fn test_closed_port_is_transport_error() {
        let (address, _, handle) = serve(vec![]);
        let host = CommandPortHost::connect(&address, KindTable::default()).unwrap();
        handle.join().unwrap();

        assert!(matches!(
            host.node_exists(&NodeName::from("skinA")),
            Err(HostError::Transport(_))
        ));
    }

    #[test]
    fn test_python_literals() {
        assert_eq!(py_str("it's \"quoted\""), r#""it's \"quoted\"""#);
        assert_eq!(py_bool(true), "True");
        assert_eq!(plug_node("skinA.input[0].inputGeometry"), "skinA");
    }
}
