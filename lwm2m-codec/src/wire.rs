//! IPC message envelope and XML (de)serialisation (spec §6).
//!
//! The envelope carries a type tag, a sub-type tag, a 32-bit session
//! identifier, an optional response code, and a content subtree rooted at
//! either `Objects` or `Clients`. Encoding walks a small generic XML
//! element tree (`XmlNode`) built with `quick-xml`'s event reader/writer —
//! the same manual event-loop style `adamtc007-ob-poc/bpmn-lite-core` uses
//! for its own tree-shaped wire format — rather than a `serde`-derived
//! schema, because the grammar is recursive and sparse (optional `Value`,
//! `Result`, subscribe-tag children) in a way serde's derive does not model
//! cleanly. Unknown tags are ignored while reading, per §4.B
//! forward-compatibility.

use crate::tree::{
    ClientNode, ClientsTree, ContentTree, ObjectInstanceNode, ObjectNode, ObjectsTree,
    ResourceInstanceNode, ResourceNode, ResultNode, SubscribeTag,
};
use lwm2m_types::{Error, LwM2MError, PathError, Result};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Request,
    Response,
    Notification,
}

impl MessageType {
    fn as_str(self) -> &'static str {
        match self {
            MessageType::Request => "Request",
            MessageType::Response => "Response",
            MessageType::Notification => "Notification",
        }
    }

    fn parse(s: &str) -> Result<Self> {
        Ok(match s {
            "Request" => MessageType::Request,
            "Response" => MessageType::Response,
            "Notification" => MessageType::Notification,
            other => return Err(Error::IPCError(format!("unknown message type {other:?}"))),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubType {
    Define,
    Get,
    Set,
    Delete,
    Execute,
    Discover,
    Subscribe,
    Observe,
    ListClients,
    ClientRegister,
    ClientDeregister,
    ClientUpdate,
}

impl SubType {
    fn as_str(self) -> &'static str {
        match self {
            SubType::Define => "Define",
            SubType::Get => "Get",
            SubType::Set => "Set",
            SubType::Delete => "Delete",
            SubType::Execute => "Execute",
            SubType::Discover => "Discover",
            SubType::Subscribe => "Subscribe",
            SubType::Observe => "Observe",
            SubType::ListClients => "ListClients",
            SubType::ClientRegister => "ClientRegister",
            SubType::ClientDeregister => "ClientDeregister",
            SubType::ClientUpdate => "ClientUpdate",
        }
    }

    fn parse(s: &str) -> Result<Self> {
        Ok(match s {
            "Define" => SubType::Define,
            "Get" => SubType::Get,
            "Set" => SubType::Set,
            "Delete" => SubType::Delete,
            "Execute" => SubType::Execute,
            "Discover" => SubType::Discover,
            "Subscribe" => SubType::Subscribe,
            "Observe" => SubType::Observe,
            "ListClients" => SubType::ListClients,
            "ClientRegister" => SubType::ClientRegister,
            "ClientDeregister" => SubType::ClientDeregister,
            "ClientUpdate" => SubType::ClientUpdate,
            other => return Err(Error::IPCError(format!("unknown sub-type {other:?}"))),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    Success,
    FailureBadRequest,
}

impl ResponseCode {
    fn as_str(self) -> &'static str {
        match self {
            ResponseCode::Success => "Success",
            ResponseCode::FailureBadRequest => "FailureBadRequest",
        }
    }

    fn parse(s: &str) -> Result<Self> {
        Ok(match s {
            "Success" => ResponseCode::Success,
            "FailureBadRequest" => ResponseCode::FailureBadRequest,
            other => return Err(Error::IPCError(format!("unknown response code {other:?}"))),
        })
    }
}

/// A full IPC message: envelope plus content subtree (spec §6).
#[derive(Debug, Clone)]
pub struct Message {
    pub message_type: MessageType,
    pub sub_type: SubType,
    pub session_id: u32,
    pub response_code: Option<ResponseCode>,
    pub content: ContentTree,
}

impl Message {
    /// Serialises the message to the XML-like wire form.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        let mut start = BytesStart::new("Message");
        start.push_attribute(("type", self.message_type.as_str()));
        start.push_attribute(("subtype", self.sub_type.as_str()));
        start.push_attribute(("sessionId", self.session_id.to_string().as_str()));
        if let Some(code) = self.response_code {
            start.push_attribute(("responseCode", code.as_str()));
        }
        writer
            .write_event(Event::Start(start))
            .map_err(|e| Error::IPCError(e.to_string()))?;

        match &self.content {
            ContentTree::Objects(tree) => write_objects_tree(&mut writer, tree)?,
            ContentTree::Clients(tree) => write_clients_tree(&mut writer, tree)?,
        }

        writer
            .write_event(Event::End(BytesEnd::new("Message")))
            .map_err(|e| Error::IPCError(e.to_string()))?;

        let bytes = writer.into_inner().into_inner();
        String::from_utf8(bytes).map_err(|e| Error::IPCError(e.to_string()))
    }

    /// Parses a wire-form message. Unknown child tags anywhere in the
    /// content subtree are silently ignored (§4.B forward-compatibility).
    pub fn from_xml(xml: &str) -> Result<Message> {
        let root = parse_xml_tree(xml)?;
        if root.name != "Message" {
            return Err(Error::IPCError(format!("expected <Message>, got <{}>", root.name)));
        }
        let message_type = MessageType::parse(root.attr("type").ok_or_else(|| Error::IPCError("missing type".into()))?)?;
        let sub_type = SubType::parse(root.attr("subtype").ok_or_else(|| Error::IPCError("missing subtype".into()))?)?;
        let session_id: u32 = root
            .attr("sessionId")
            .ok_or_else(|| Error::IPCError("missing sessionId".into()))?
            .parse()
            .map_err(|_| Error::IPCError("sessionId not a u32".into()))?;
        let response_code = root.attr("responseCode").map(ResponseCode::parse).transpose()?;

        let content = if let Some(objects) = root.child("Objects") {
            ContentTree::Objects(objects_tree_from_xml(objects))
        } else if let Some(clients) = root.child("Clients") {
            ContentTree::Clients(clients_tree_from_xml(clients))
        } else {
            ContentTree::Objects(ObjectsTree::default())
        };

        Ok(Message {
            message_type,
            sub_type,
            session_id,
            response_code,
            content,
        })
    }
}

// ---------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------

fn write_text_elem(writer: &mut Writer<Cursor<Vec<u8>>>, name: &str, text: &str) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(|e| Error::IPCError(e.to_string()))?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(|e| Error::IPCError(e.to_string()))?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(|e| Error::IPCError(e.to_string()))
}

fn write_result(writer: &mut Writer<Cursor<Vec<u8>>>, result: &ResultNode) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new("Result")))
        .map_err(|e| Error::IPCError(e.to_string()))?;
    let (error_str, lwm2m_error) = path_error_to_wire(result.error);
    write_text_elem(writer, "Error", error_str)?;
    if let Some(lw) = lwm2m_error {
        write_text_elem(writer, "LWM2MError", lwm2m_error_to_wire(lw))?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("Result")))
        .map_err(|e| Error::IPCError(e.to_string()))
}

fn write_objects_tree(writer: &mut Writer<Cursor<Vec<u8>>>, tree: &ObjectsTree) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new("Objects")))
        .map_err(|e| Error::IPCError(e.to_string()))?;
    for object in &tree.objects {
        write_object_node(writer, object)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("Objects")))
        .map_err(|e| Error::IPCError(e.to_string()))
}

fn write_object_node(writer: &mut Writer<Cursor<Vec<u8>>>, object: &ObjectNode) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new("Object")))
        .map_err(|e| Error::IPCError(e.to_string()))?;
    write_text_elem(writer, "ID", &object.id.to_string())?;
    for instance in &object.instances {
        write_instance_node(writer, instance)?;
    }
    if let Some(result) = &object.result {
        write_result(writer, result)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("Object")))
        .map_err(|e| Error::IPCError(e.to_string()))
}

fn write_instance_node(writer: &mut Writer<Cursor<Vec<u8>>>, instance: &ObjectInstanceNode) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new("ObjectInstance")))
        .map_err(|e| Error::IPCError(e.to_string()))?;
    write_text_elem(writer, "ID", &instance.id.to_string())?;
    for resource in &instance.resources {
        write_resource_node(writer, resource)?;
    }
    if let Some(result) = &instance.result {
        write_result(writer, result)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("ObjectInstance")))
        .map_err(|e| Error::IPCError(e.to_string()))
}

fn write_resource_node(writer: &mut Writer<Cursor<Vec<u8>>>, resource: &ResourceNode) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new("Resource")))
        .map_err(|e| Error::IPCError(e.to_string()))?;
    write_text_elem(writer, "ID", &resource.id.to_string())?;
    if let Some(value) = &resource.value {
        write_text_elem(writer, "Value", value)?;
    }
    for ri in &resource.instances {
        write_resource_instance_node(writer, ri)?;
    }
    if let Some(tag) = resource.subscribe {
        writer
            .write_event(Event::Empty(BytesStart::new(tag.as_str())))
            .map_err(|e| Error::IPCError(e.to_string()))?;
    }
    if let Some(result) = &resource.result {
        write_result(writer, result)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("Resource")))
        .map_err(|e| Error::IPCError(e.to_string()))
}

fn write_resource_instance_node(writer: &mut Writer<Cursor<Vec<u8>>>, ri: &ResourceInstanceNode) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new("ResourceInstance")))
        .map_err(|e| Error::IPCError(e.to_string()))?;
    write_text_elem(writer, "ID", &ri.id.to_string())?;
    if let Some(value) = &ri.value {
        write_text_elem(writer, "Value", value)?;
    }
    if let Some(result) = &ri.result {
        write_result(writer, result)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("ResourceInstance")))
        .map_err(|e| Error::IPCError(e.to_string()))
}

fn write_clients_tree(writer: &mut Writer<Cursor<Vec<u8>>>, tree: &ClientsTree) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new("Clients")))
        .map_err(|e| Error::IPCError(e.to_string()))?;
    for client in &tree.clients {
        write_client_node(writer, client)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("Clients")))
        .map_err(|e| Error::IPCError(e.to_string()))
}

fn write_client_node(writer: &mut Writer<Cursor<Vec<u8>>>, client: &ClientNode) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new("Client")))
        .map_err(|e| Error::IPCError(e.to_string()))?;
    write_text_elem(writer, "ID", &client.id.to_string())?;
    if let Some(objects) = &client.objects {
        write_objects_tree(writer, objects)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("Client")))
        .map_err(|e| Error::IPCError(e.to_string()))
}

fn path_error_to_wire(error: PathError) -> (&'static str, Option<LwM2MError>) {
    match error {
        PathError::Success => ("Success", None),
        PathError::PathNotFound => ("PathNotFound", None),
        PathError::NotDefined => ("NotDefined", None),
        PathError::TypeMismatch => ("TypeMismatch", None),
        PathError::LWM2MError(lw) => ("LWM2MError", Some(lw)),
        PathError::Timeout => ("Timeout", None),
        PathError::Internal => ("Internal", None),
    }
}

fn lwm2m_error_to_wire(lw: LwM2MError) -> &'static str {
    match lw {
        LwM2MError::BadRequest => "BadRequest",
        LwM2MError::Unauthorized => "Unauthorized",
        LwM2MError::NotFound => "NotFound",
        LwM2MError::MethodNotAllowed => "MethodNotAllowed",
        LwM2MError::NotAcceptable => "NotAcceptable",
        LwM2MError::Timeout => "Timeout",
    }
}

fn wire_to_path_error(s: &str, lwm2m_error: Option<&str>) -> PathError {
    match s {
        "Success" => PathError::Success,
        "PathNotFound" => PathError::PathNotFound,
        "NotDefined" => PathError::NotDefined,
        "TypeMismatch" => PathError::TypeMismatch,
        "LWM2MError" => PathError::LWM2MError(wire_to_lwm2m_error(lwm2m_error.unwrap_or(""))),
        "Timeout" => PathError::Timeout,
        _ => PathError::Internal,
    }
}

fn wire_to_lwm2m_error(s: &str) -> LwM2MError {
    match s {
        "BadRequest" => LwM2MError::BadRequest,
        "Unauthorized" => LwM2MError::Unauthorized,
        "NotFound" => LwM2MError::NotFound,
        "MethodNotAllowed" => LwM2MError::MethodNotAllowed,
        "NotAcceptable" => LwM2MError::NotAcceptable,
        _ => LwM2MError::Timeout,
    }
}

// ---------------------------------------------------------------------
// Reading — a small generic element tree, then typed conversion.
// ---------------------------------------------------------------------

struct XmlNode {
    name: String,
    attrs: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<XmlNode>,
}

impl XmlNode {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.name == name)
    }
}

fn parse_xml_tree(xml: &str) -> Result<XmlNode> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text = true;

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let node = XmlNode {
                    name: tag_name(&e),
                    attrs: tag_attrs(&e),
                    text: None,
                    children: Vec::new(),
                };
                stack.push(node);
            }
            Ok(Event::Empty(e)) => {
                let node = XmlNode {
                    name: tag_name(&e),
                    attrs: tag_attrs(&e),
                    text: None,
                    children: Vec::new(),
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => return Ok(node),
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(top) = stack.last_mut() {
                    let text = t.unescape().map_err(|e| Error::IPCError(e.to_string()))?.to_string();
                    if !text.is_empty() {
                        top.text = Some(text);
                    }
                }
            }
            Ok(Event::End(_)) => {
                let node = stack.pop().ok_or_else(|| Error::IPCError("unbalanced closing tag".into()))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => return Ok(node),
                }
            }
            Ok(Event::Eof) => return Err(Error::IPCError("unexpected end of document".into())),
            Err(e) => return Err(Error::IPCError(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
}

fn tag_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn tag_attrs(e: &BytesStart) -> Vec<(String, String)> {
    e.attributes()
        .filter_map(|a| a.ok())
        .map(|a| {
            (
                String::from_utf8_lossy(a.key.as_ref()).into_owned(),
                a.unescape_value().map(|v| v.into_owned()).unwrap_or_default(),
            )
        })
        .collect()
}

fn result_from_xml(node: &XmlNode) -> Option<ResultNode> {
    let result_node = node.child("Result")?;
    let error_text = result_node.child("Error")?.text.as_deref()?;
    let lwm2m_text = result_node.child("LWM2MError").and_then(|n| n.text.as_deref());
    Some(ResultNode {
        error: wire_to_path_error(error_text, lwm2m_text),
    })
}

fn objects_tree_from_xml(node: &XmlNode) -> ObjectsTree {
    ObjectsTree {
        objects: node.children_named("Object").map(object_node_from_xml).collect(),
    }
}

fn object_node_from_xml(node: &XmlNode) -> ObjectNode {
    let id = node.child("ID").and_then(|n| n.text.as_deref()).and_then(|s| s.parse().ok()).unwrap_or(0);
    ObjectNode {
        id,
        instances: node
            .children_named("ObjectInstance")
            .map(instance_node_from_xml)
            .collect(),
        result: result_from_xml(node),
    }
}

fn instance_node_from_xml(node: &XmlNode) -> ObjectInstanceNode {
    let id = node.child("ID").and_then(|n| n.text.as_deref()).and_then(|s| s.parse().ok()).unwrap_or(0);
    ObjectInstanceNode {
        id,
        resources: node.children_named("Resource").map(resource_node_from_xml).collect(),
        result: result_from_xml(node),
    }
}

fn resource_node_from_xml(node: &XmlNode) -> ResourceNode {
    let id = node.child("ID").and_then(|n| n.text.as_deref()).and_then(|s| s.parse().ok()).unwrap_or(0);
    let subscribe = node.children.iter().find_map(|c| SubscribeTag::parse(&c.name));
    ResourceNode {
        id,
        value: node.child("Value").map(|n| n.text.clone().unwrap_or_default()),
        instances: node
            .children_named("ResourceInstance")
            .map(resource_instance_node_from_xml)
            .collect(),
        subscribe,
        result: result_from_xml(node),
    }
}

fn resource_instance_node_from_xml(node: &XmlNode) -> ResourceInstanceNode {
    let id = node.child("ID").and_then(|n| n.text.as_deref()).and_then(|s| s.parse().ok()).unwrap_or(0);
    ResourceInstanceNode {
        id,
        value: node.child("Value").map(|n| n.text.clone().unwrap_or_default()),
        result: result_from_xml(node),
    }
}

fn clients_tree_from_xml(node: &XmlNode) -> ClientsTree {
    ClientsTree {
        clients: node.children_named("Client").map(client_node_from_xml).collect(),
    }
}

fn client_node_from_xml(node: &XmlNode) -> ClientNode {
    let id = node.child("ID").and_then(|n| n.text.as_deref()).and_then(|s| s.parse().ok()).unwrap_or(0);
    ClientNode {
        id,
        objects: node.child("Objects").map(objects_tree_from_xml),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeLeaf;
    use lwm2m_types::{InstanceId, ObjectId, Path, ResourceId, ResourceValue};

    #[test]
    fn round_trips_a_get_request() {
        let leaves = vec![TreeLeaf {
            path: Path::resource(ObjectId(3), InstanceId(0), ResourceId(0)),
            value: None,
            subscribe: None,
        }];
        let msg = Message {
            message_type: MessageType::Request,
            sub_type: SubType::Get,
            session_id: 42,
            response_code: None,
            content: ContentTree::Objects(ObjectsTree::build(&leaves)),
        };
        let xml = msg.to_xml().unwrap();
        let parsed = Message::from_xml(&xml).unwrap();
        assert_eq!(parsed.message_type, MessageType::Request);
        assert_eq!(parsed.sub_type, SubType::Get);
        assert_eq!(parsed.session_id, 42);
        match parsed.content {
            ContentTree::Objects(tree) => assert_eq!(tree.objects.len(), 1),
            _ => panic!("expected Objects content"),
        }
    }

    #[test]
    fn round_trips_a_response_with_result() {
        let mut tree = ObjectsTree::default();
        tree.objects.push(ObjectNode {
            id: 3,
            instances: vec![ObjectInstanceNode {
                id: 0,
                resources: vec![ResourceNode {
                    id: 0,
                    value: Some("Acme".to_string()),
                    instances: vec![],
                    subscribe: None,
                    result: Some(ResultNode { error: PathError::Success }),
                }],
                result: None,
            }],
            result: None,
        });
        let msg = Message {
            message_type: MessageType::Response,
            sub_type: SubType::Get,
            session_id: 1,
            response_code: Some(ResponseCode::Success),
            content: ContentTree::Objects(tree),
        };
        let xml = msg.to_xml().unwrap();
        let parsed = Message::from_xml(&xml).unwrap();
        assert_eq!(parsed.response_code, Some(ResponseCode::Success));
        let walked = match parsed.content {
            ContentTree::Objects(t) => t.walk(),
            _ => panic!("expected Objects content"),
        };
        assert_eq!(walked.len(), 1);
        assert_eq!(walked[0].1.as_deref(), Some("Acme"));
        assert_eq!(walked[0].2.unwrap().error, PathError::Success);
    }

    #[test]
    fn ignores_unknown_tags() {
        let xml = r#"<Message type="Request" subtype="Get" sessionId="1"><Objects><Object><ID>3</ID><FutureTag>x</FutureTag></Object></Objects></Message>"#;
        let parsed = Message::from_xml(xml).unwrap();
        match parsed.content {
            ContentTree::Objects(t) => assert_eq!(t.objects.len(), 1),
            _ => panic!("expected Objects content"),
        }
    }
}
