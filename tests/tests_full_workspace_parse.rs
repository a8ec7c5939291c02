//! Black-box parse of a complete workspace: model, a system context view
//! with include/exclude/autoLayout, and an element style block.

use archdsl::model::{ElementKind, Workspace};
use archdsl::Parser;

const SOURCE: &str = r#"
workspace "Example" "An example workspace" {
    model {
        u = person "User" "A user of the system"
        s = softwareSystem "System" "Does the thing" {
            api = container "API" "Handles requests" "Rust"
            db = container "Database" "Stores data" "Postgres"
            api -> db "Reads and writes" "SQL"
        }
        u -> s "Uses"
    }

    views {
        systemContext s "SystemContext" {
            include *
            exclude "u -> *"
            autoLayout tb 300 100
        }

        styles {
            element "Person" {
                shape person
                background #08427b
            }
        }
    }
}
"#;

#[test]
fn full_workspace_parses_model_and_views() {
    let mut parser = Parser::<Workspace>::new();
    parser.parse_str(SOURCE).expect("valid workspace source should parse");

    let ws = parser.workspace().unwrap();
    assert_eq!(ws.name, "Example");
    assert_eq!(ws.model.elements.len(), 4);
    assert_eq!(ws.model.relationships.len(), 2);

    let user = ws.model.elements.iter().find(|e| e.name == "User").unwrap();
    assert!(matches!(user.kind, ElementKind::Person));

    let api = ws.model.elements.iter().find(|e| e.name == "API").unwrap();
    assert!(matches!(api.kind, ElementKind::Container));
    assert_eq!(api.technology, "Rust");

    assert_eq!(ws.views.len(), 1);
    let view = &ws.views[0];
    assert_eq!(view.includes, vec!["*".to_string()]);
    assert_eq!(view.excludes, vec!["u -> *".to_string()]);
    let layout = view.auto_layout.as_ref().unwrap();
    assert_eq!(layout.rank_direction.as_deref(), Some("tb"));
    assert_eq!(layout.rank_separation, Some(300));
    assert_eq!(layout.node_separation, Some(100));

    assert_eq!(ws.element_styles.len(), 1);
    assert_eq!(ws.element_styles[0].shape.as_deref(), Some("person"));
    assert_eq!(ws.element_styles[0].background.as_deref(), Some("#08427b"));
}

#[test]
fn unresolvable_relationship_target_reports_the_offending_line() {
    let mut parser = Parser::<Workspace>::new();
    let err = parser
        .parse_str(
            r#"workspace {
    model {
        u = person "User"
        u -> ghost "Uses"
    }
}"#,
        )
        .unwrap_err();
    assert!(err.to_string().contains("ghost"));
}
