use docbot_archive::{
    write_archive, ArchiveError, ArchiveOpener, ClassDoc, ClassKind, ClassName, DocArchive,
    LibraryInfo, MethodDoc, ZipArchiveOpener, ZipDocArchive,
};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::TempDir;

fn jdk_info() -> LibraryInfo {
    LibraryInfo {
        name: "java-se".to_string(),
        version: Some("21".to_string()),
        base_url: Some("https://docs.example.org/api/".to_string()),
        project_url: None,
    }
}

fn string_doc() -> ClassDoc {
    let mut doc = ClassDoc::new(ClassName::from_full("java.lang.String"))
        .with_description("The String class represents character strings.");
    doc.modifiers = vec!["public".to_string(), "final".to_string()];
    doc.interfaces = vec!["java.lang.CharSequence".to_string()];
    doc.since = Some("1.0".to_string());
    doc.methods = vec![MethodDoc {
        name: "length".to_string(),
        signature: "int length()".to_string(),
        description: "Returns the length of this string.".to_string(),
        deprecated: false,
    }];
    doc
}

#[test]
fn written_archive_lists_and_parses_classes() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("java-se.zip");
    let list = ClassDoc::new(ClassName::from_full("java.util.List")).with_kind(ClassKind::Interface);
    write_archive(&path, Some(&jdk_info()), &[string_doc(), list]).expect("write archive");

    let archive = ZipArchiveOpener.open(&path).expect("open archive");
    assert_eq!(archive.path(), path.as_path());
    assert_eq!(archive.library().map(|info| info.name.as_str()), Some("java-se"));

    let mut names: Vec<ClassName> = archive.classes().collect();
    names.sort_by(|a, b| a.full.cmp(&b.full));
    assert_eq!(
        names,
        vec![
            ClassName::from_full("java.lang.String"),
            ClassName::from_full("java.util.List"),
        ]
    );
    // restartable: a second pass yields the same classes
    assert_eq!(archive.classes().count(), 2);

    let doc = archive
        .class_doc("java.lang.String")
        .expect("parse")
        .expect("present");
    assert_eq!(doc.name.simple, "String");
    assert_eq!(doc.modifiers, vec!["public", "final"]);
    assert_eq!(doc.methods.len(), 1);
    assert_eq!(
        doc.url.as_deref(),
        Some("https://docs.example.org/api/java/lang/String.html")
    );
    assert_eq!(doc.library, Some(jdk_info()));

    let list = archive
        .class_doc("java.util.List")
        .expect("parse")
        .expect("present");
    assert_eq!(list.kind, ClassKind::Interface);

    assert!(archive.class_doc("java.util.Map").expect("lookup").is_none());
}

#[test]
fn archive_without_info_has_no_library() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("bare.zip");
    write_archive(&path, None, &[string_doc()]).expect("write archive");

    let archive = ZipDocArchive::open(&path).expect("open archive");
    assert_eq!(archive.len(), 1);
    assert!(archive.library().is_none());
    let doc = archive
        .class_doc("java.lang.String")
        .expect("parse")
        .expect("present");
    assert!(doc.url.is_none());
}

#[test]
fn corrupt_file_is_a_load_error() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("broken.zip");
    std::fs::write(&path, b"definitely not a zip").expect("write");

    let err = ZipDocArchive::open(&path).expect_err("must fail");
    assert!(matches!(err, ArchiveError::Zip { .. }), "unexpected error: {err}");
    assert!(!err.is_parse_error());

    let missing = ZipDocArchive::open(temp.path().join("missing.zip")).expect_err("must fail");
    assert!(matches!(missing, ArchiveError::Io { .. }));
}

#[test]
fn corrupt_class_entry_is_a_parse_error() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("half.zip");
    {
        let file = std::fs::File::create(&path).expect("create");
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("a.Widget.json", options).expect("start");
        zip.write_all(b"{ not json").expect("write");
        zip.start_file("a.Gadget.json", options).expect("start");
        zip.write_all(b"{}").expect("write");
        zip.finish().expect("finish");
    }

    let archive = ZipDocArchive::open(&path).expect("open archive");
    assert_eq!(archive.len(), 2);

    let err = archive.class_doc("a.Widget").expect_err("must fail");
    assert!(err.is_parse_error());

    let gadget = archive
        .class_doc("a.Gadget")
        .expect("parse")
        .expect("present");
    assert_eq!(gadget.kind, ClassKind::Class);
    assert_eq!(gadget.description, "");
}
