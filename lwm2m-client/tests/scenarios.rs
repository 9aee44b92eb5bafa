//! End-to-end scenarios against a fake daemon (spec §8): a session
//! connects, performs an operation, and (for the subscription scenarios)
//! has a notification dispatched back to the callback that registered for
//! it — all without a real CoAP daemon in the loop.

mod support;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use lwm2m_client::{DeleteOperation, ExecuteOperation, GetOperation, Session, SessionKind, SetOperation, SubscribeOperation};
use lwm2m_codec::wire::SubType;
use lwm2m_types::{InstanceId, ObjectId, Path, ResourceId, ResourceValue};

use support::FakeDaemon;

#[test]
fn get_single_resource_returns_its_value() {
    let daemon = FakeDaemon::spawn(|msg| {
        let (path, _) = support::first_leaf(&msg).unwrap();
        vec![support::response(msg.session_id, msg.sub_type, path, Some("Acme".to_string()))]
    });

    let session = Session::new(SessionKind::Client);
    session.set_ipc_udp("127.0.0.1", daemon.port()).unwrap();
    session.set_default_timeout(Duration::from_secs(1)).unwrap();
    session.connect().unwrap();

    let path = Path::resource(ObjectId(3), InstanceId(0), ResourceId(0));
    let mut get = GetOperation::new(&session);
    get.add_path(path);
    get.perform(Duration::from_secs(1)).unwrap();

    let response = get.get_response().unwrap();
    assert!(response.paths().any(|p| p == path));
    assert_eq!(response.get_string(path).unwrap(), "Acme");
}

#[test]
fn set_after_subscribe_invokes_the_change_callback_exactly_once() {
    let daemon = FakeDaemon::spawn(|msg| {
        let (path, value) = support::first_leaf(&msg).unwrap();
        match msg.sub_type {
            SubType::Subscribe => vec![support::response(msg.session_id, SubType::Subscribe, path, None)],
            SubType::Set => vec![
                support::response(msg.session_id, SubType::Set, path, None),
                support::notification(msg.session_id, SubType::Subscribe, path, value),
            ],
            _ => vec![],
        }
    });

    let session = Session::new(SessionKind::Client);
    session.set_ipc_udp("127.0.0.1", daemon.port()).unwrap();
    session.set_default_timeout(Duration::from_secs(1)).unwrap();
    session.connect().unwrap();

    let path = Path::resource(ObjectId(3), InstanceId(0), ResourceId(16));
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_cb = Arc::clone(&seen);

    let mut subscribe = SubscribeOperation::new(&session);
    subscribe
        .add_change(path, move |change| {
            seen_cb.lock().unwrap().push(change.get_string().unwrap());
        })
        .unwrap();
    subscribe.perform(Duration::from_secs(1)).unwrap();

    let mut set = SetOperation::new(&session);
    set.add_value(path, ResourceValue::String("123414123".into()), None).unwrap();
    set.perform(Duration::from_secs(1)).unwrap();

    session.process(Duration::from_millis(200)).unwrap();
    session.dispatch_callbacks();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0], "123414123");
}

#[test]
fn array_value_change_is_observed_at_its_own_index() {
    let daemon = FakeDaemon::spawn(|msg| {
        let (path, value) = support::first_leaf(&msg).unwrap();
        match msg.sub_type {
            SubType::Subscribe => vec![support::response(msg.session_id, SubType::Subscribe, path, None)],
            SubType::Set => vec![
                support::response(msg.session_id, SubType::Set, path, None),
                support::notification(msg.session_id, SubType::Subscribe, path, value),
            ],
            _ => vec![],
        }
    });

    let session = Session::new(SessionKind::Client);
    session.set_ipc_udp("127.0.0.1", daemon.port()).unwrap();
    session.set_default_timeout(Duration::from_secs(1)).unwrap();
    session.connect().unwrap();

    let array_path = Path::resource(ObjectId(3), InstanceId(0), ResourceId(6));
    let seen: Arc<Mutex<Option<(Path, i64)>>> = Arc::new(Mutex::new(None));
    let seen_cb = Arc::clone(&seen);

    let mut subscribe = SubscribeOperation::new(&session);
    subscribe
        .add_change(array_path, move |change| {
            *seen_cb.lock().unwrap() = Some((change.path(), change.get_integer().unwrap()));
        })
        .unwrap();
    subscribe.perform(Duration::from_secs(1)).unwrap();

    let mut set = SetOperation::new(&session);
    set.add_array_value(array_path, 0, ResourceValue::Integer(1234)).unwrap();
    set.perform(Duration::from_secs(1)).unwrap();

    session.process(Duration::from_millis(200)).unwrap();
    session.dispatch_callbacks();

    let (changed_path, value) = seen.lock().unwrap().expect("change callback fired");
    assert_eq!(
        changed_path,
        Path::resource_instance(ObjectId(3), InstanceId(0), ResourceId(6), 0.into())
    );
    assert_eq!(value, 1234);
}

#[test]
fn execute_with_payload_is_delivered_to_the_execute_subscription() {
    let daemon = FakeDaemon::spawn(|msg| {
        let (path, value) = support::first_leaf(&msg).unwrap();
        match msg.sub_type {
            SubType::Subscribe => vec![support::response(msg.session_id, SubType::Subscribe, path, None)],
            SubType::Execute => vec![
                support::response(msg.session_id, SubType::Execute, path, None),
                support::notification(msg.session_id, SubType::Execute, path, value),
            ],
            _ => vec![],
        }
    });

    let session = Session::new(SessionKind::Client);
    session.set_ipc_udp("127.0.0.1", daemon.port()).unwrap();
    session.set_default_timeout(Duration::from_secs(1)).unwrap();
    session.connect().unwrap();

    let path = Path::resource(ObjectId(3), InstanceId(0), ResourceId(4));
    let seen: Arc<Mutex<Option<Vec<u8>>>> = Arc::new(Mutex::new(None));
    let seen_cb = Arc::clone(&seen);

    let mut subscribe = SubscribeOperation::new(&session);
    subscribe
        .add_execute(path, move |args| {
            *seen_cb.lock().unwrap() = args.as_bytes().map(|b| b.to_vec());
        })
        .unwrap();
    subscribe.perform(Duration::from_secs(1)).unwrap();

    let payload = vec![0u8, b'h', b'e', b'l', b'l', b'o'];
    let mut execute = ExecuteOperation::new(&session);
    execute.add_path(path, Some(payload.clone())).unwrap();
    execute.perform(Duration::from_secs(1)).unwrap();

    session.process(Duration::from_millis(200)).unwrap();
    session.dispatch_callbacks();

    let received = seen.lock().unwrap().clone().expect("execute callback fired");
    assert_eq!(received.len(), 6);
    assert_eq!(received, payload);
}

#[test]
fn creating_then_deleting_an_object_instance_changes_what_get_reports() {
    let object = ObjectId(7997);
    let instance_path = Path::instance(object, InstanceId(0));
    let created = Arc::new(Mutex::new(false));
    let created_in_daemon = Arc::clone(&created);

    let daemon = FakeDaemon::spawn(move |msg| {
        let (path, _) = support::first_leaf(&msg).unwrap();
        match msg.sub_type {
            SubType::Set => {
                *created_in_daemon.lock().unwrap() = true;
                vec![support::response(msg.session_id, SubType::Set, path, None)]
            }
            SubType::Delete => {
                *created_in_daemon.lock().unwrap() = false;
                vec![support::response(msg.session_id, SubType::Delete, path, None)]
            }
            SubType::Get => {
                let reply_path = if *created_in_daemon.lock().unwrap() {
                    Path::instance(ObjectId(7997), InstanceId(0))
                } else {
                    Path::object(ObjectId(7997))
                };
                vec![support::response(msg.session_id, SubType::Get, reply_path, None)]
            }
            _ => vec![],
        }
    });

    let session = Session::new(SessionKind::Client);
    session.set_ipc_udp("127.0.0.1", daemon.port()).unwrap();
    session.set_default_timeout(Duration::from_secs(1)).unwrap();
    session.connect().unwrap();

    let mut set = SetOperation::new(&session);
    set.add_create_instance(object, Some(InstanceId(0)));
    set.perform(Duration::from_secs(1)).unwrap();

    let mut get = GetOperation::new(&session);
    get.add_path(Path::object(object));
    get.perform(Duration::from_secs(1)).unwrap();
    assert!(get.get_response().unwrap().paths().any(|p| p == instance_path));

    let mut delete = DeleteOperation::new(&session);
    delete.add_path(instance_path).unwrap();
    delete.perform(Duration::from_secs(1)).unwrap();

    let mut get_after = GetOperation::new(&session);
    get_after.add_path(Path::object(object));
    get_after.perform(Duration::from_secs(1)).unwrap();
    assert!(!get_after.get_response().unwrap().paths().any(|p| p == instance_path));
}
