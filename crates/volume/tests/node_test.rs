use common::{Node, NodeData, NodeDataExt, Value};
use volume::create_volume;

#[test]
fn data_round_trips_every_alternative() {
    let v = create_volume();
    let d = v.open();
    d.write("bool", Value::from(true));
    d.write("char", Value::from(-121i8));
    d.write("uchar", Value::from(104u8));
    d.write("int16", Value::from(-32i16));
    d.write("uint16", Value::from(48u16));
    d.write("int32", Value::from(-35000i32));
    d.write("uint32", Value::from(10004u32));
    d.write("int64", Value::from(-10000000i64));
    d.write("uint64", Value::from(1000456u64));
    d.write("float", Value::from(23.567f32));
    d.write("double", Value::from(1234.567678f64));
    d.write("string", Value::string("Ю").unwrap());
    d.write("blob", Value::blob(vec![1u8, 2, 3, 4]).unwrap());

    assert_eq!(d.read_as::<bool>("bool"), Some(true));
    assert_eq!(d.read_as::<i8>("char"), Some(-121));
    assert_eq!(d.read_as::<u8>("uchar"), Some(104));
    assert_eq!(d.read_as::<i16>("int16"), Some(-32));
    assert_eq!(d.read_as::<u16>("uint16"), Some(48));
    assert_eq!(d.read_as::<i32>("int32"), Some(-35000));
    assert_eq!(d.read_as::<u32>("uint32"), Some(10004));
    assert_eq!(d.read_as::<i64>("int64"), Some(-10000000));
    assert_eq!(d.read_as::<u64>("uint64"), Some(1000456));
    assert_eq!(d.read_as::<f32>("float"), Some(23.567));
    assert_eq!(d.read_as::<f64>("double"), Some(1234.567678));
    assert_eq!(d.read_as::<String>("string").as_deref(), Some("Ю"));
    assert_eq!(d.read_as::<Vec<u8>>("blob"), Some(vec![1, 2, 3, 4]));
}

#[test]
fn enumerate_snapshots_live_entries() {
    let v = create_volume();
    let d = v.open();
    d.write("good", Value::string("buy").unwrap());
    d.write("hello", Value::string("world").unwrap());

    let mut fields = d.enumerate();
    fields.sort_by(|lhs, rhs| lhs.0.cmp(&rhs.0));

    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].0, "good");
    assert_eq!(fields[0].1.try_as::<String>().as_deref(), Some("buy"));
    assert_eq!(fields[1].0, "hello");
    assert_eq!(fields[1].1.try_as::<String>().as_deref(), Some("world"));
}

#[test]
fn enumerate_excludes_removed_entries() {
    let v = create_volume();
    let d = v.open();
    d.write("good", Value::string("buy").unwrap());
    d.write("hello", Value::string("world").unwrap());
    assert!(d.remove("hello"));

    let fields = d.enumerate();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].0, "good");
}

#[test]
fn read_distinguishes_payload_type() {
    let v = create_volume();
    let d = v.open();
    assert!(d.read("hello").is_none());

    d.write("hello", Value::string("world").unwrap());
    assert_eq!(d.read_as::<String>("hello").as_deref(), Some("world"));
    assert_eq!(d.read_as::<i32>("hello"), None);
}

#[test]
fn remove_reports_absence_on_second_call() {
    let v = create_volume();
    let d = v.open();
    d.write("hello", Value::string("world").unwrap());
    assert!(d.read("hello").is_some());
    assert!(d.remove("hello"));
    assert!(d.read("hello").is_none());
    assert!(!d.remove("hello"));
}

#[test]
fn write_overwrites_and_may_change_type() {
    let d = create_volume().open();
    d.write("number", Value::from(42i32));
    assert_eq!(d.read_as::<i32>("number"), Some(42));

    d.write("number", Value::from(54i32));
    assert_eq!(d.read_as::<i32>("number"), Some(54));

    d.write("number", Value::string("string number").unwrap());
    assert_eq!(
        d.read_as::<String>("number").as_deref(),
        Some("string number")
    );
}

#[test]
fn update_touches_only_existing_keys() {
    let d = create_volume().open();
    d.write("number", Value::from(42i32));
    assert_eq!(d.read_as::<i32>("number"), Some(42));

    assert!(d.update("number", Value::from(50i32)));
    assert_eq!(d.read_as::<i32>("number"), Some(50));

    assert!(!d.update("other", Value::from(34i32)));
    assert!(d.read("other").is_none());
}

#[test]
fn children_create_and_find() {
    let v = create_volume();
    v.create("child1").unwrap().create("child11").unwrap();
    v.create("child2").unwrap();

    let c1 = v.find("child1").expect("child1 exists");
    assert!(c1.find("child11").is_some());
    assert!(v.find("child2").is_some());
    assert!(v.find("absent").is_none());
}

#[test]
fn children_enumerate_with_data() {
    let v = create_volume();
    v.create("c1").unwrap().open().write("text", Value::string("t1").unwrap());
    v.create("c2").unwrap().open().write("text", Value::string("t2").unwrap());
    v.create("c3").unwrap().open().write("text", Value::string("t3").unwrap());

    let mut children = v.enumerate();
    children.sort_by_key(|child| child.name());

    assert_eq!(children.len(), 3);
    assert_eq!(children[0].name(), "c1");
    assert_eq!(children[0].open().read_as::<String>("text").as_deref(), Some("t1"));
    assert_eq!(children[1].name(), "c2");
    assert_eq!(children[1].open().read_as::<String>("text").as_deref(), Some("t2"));
    assert_eq!(children[2].name(), "c3");
    assert_eq!(children[2].open().read_as::<String>("text").as_deref(), Some("t3"));
}

#[test]
fn enumerate_excludes_unlinked_children() {
    let v = create_volume();
    v.create("c1").unwrap();
    v.create("c2").unwrap();
    v.create("c3").unwrap();
    assert!(v.unlink("c2"));

    let mut children = v.enumerate();
    children.sort_by_key(|child| child.name());

    assert_eq!(children.len(), 2);
    assert_eq!(children[0].name(), "c1");
    assert_eq!(children[1].name(), "c3");
}

#[test]
fn unlinked_subtree_survives_through_live_handle() {
    let v = create_volume();
    let c1 = v.create("c1").unwrap();
    c1.create("c2").unwrap();
    c1.open().write("num", Value::from(32i32));

    assert!(v.find("c1").is_some());
    assert!(v.unlink("c1"));
    assert!(v.find("c1").is_none());
    assert!(!v.unlink("c1"));

    // The handle obtained before the unlink still sees the whole subtree.
    assert!(c1.find("c2").is_some());
    assert_eq!(c1.open().read_as::<i32>("num"), Some(32));
}

#[test]
fn create_returns_the_existing_child() {
    let v = create_volume();
    v.create("c1").unwrap().create("c2").unwrap();
    v.create("c1").unwrap().open().write("num", Value::from(38i32));

    let c1 = v.find("c1").expect("c1 exists");
    assert!(c1.find("c2").is_some());
    assert_eq!(c1.open().read_as::<i32>("num"), Some(38));

    assert!(v.create("c1").unwrap().ptr_eq(&c1));
}
