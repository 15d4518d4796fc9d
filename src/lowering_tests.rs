#[cfg(test)]
mod tests {
    use crate::diagnostics::DiagnosticKind;
    use crate::facts::{collect_facts, BindTargetFact, ComponentDescriptor, PropertyDescriptor};
    use crate::ir::{
        AttributeNode, BindDocument, BindUsage, ComponentNode, ContentFragment, ElementNode,
        GeneratedAttribute, HtmlAttribute, SourceLocation, TagKind, TemplateNode,
    };
    use crate::lowering::{
        lower_document, lower_usage, parse_bind_attribute_name, suppress_duplicates, DropReason,
        LoweringOutcome,
    };
    use crate::matching::match_bind_attributes;
    use crate::options::ExpansionOptions;
    use crate::registry::{BindTarget, BindTargetRegistry};

    fn mock_loc() -> SourceLocation {
        SourceLocation { line: 1, column: 1 }
    }

    fn html(name: &str, value: &str) -> AttributeNode {
        AttributeNode::Html(HtmlAttribute {
            name: name.to_string(),
            value: Some(value.to_string()),
            location: mock_loc(),
        })
    }

    fn prop(name: &str, type_name: &str, is_delegate: bool) -> PropertyDescriptor {
        PropertyDescriptor {
            name: name.to_string(),
            type_name: type_name.to_string(),
            is_delegate,
        }
    }

    fn components() -> Vec<ComponentDescriptor> {
        vec![
            ComponentDescriptor {
                type_name: "MyComponent".to_string(),
                properties: vec![
                    prop("Value", "int", false),
                    prop("ValueChanged", "Action<int>", true),
                ],
            },
            ComponentDescriptor {
                type_name: "PlainComponent".to_string(),
                properties: vec![prop("Value", "int", false)],
            },
        ]
    }

    /// Scenario facts: text and checkbox inputs only.
    fn input_registry() -> BindTargetRegistry {
        let facts = vec![
            BindTargetFact::new("input", Some("text"), "value", "changed"),
            BindTargetFact::new("input", Some("checkbox"), "checked", "changed"),
        ];
        BindTargetRegistry::build(&facts, &components(), &ExpansionOptions::default())
    }

    fn element(tag: &str, attributes: Vec<AttributeNode>) -> TemplateNode {
        TemplateNode::Element(ElementNode {
            tag: tag.to_string(),
            attributes,
            children: vec![],
            diagnostics: vec![],
            location: mock_loc(),
        })
    }

    fn component(name: &str, attributes: Vec<AttributeNode>) -> TemplateNode {
        TemplateNode::Component(ComponentNode {
            name: name.to_string(),
            attributes,
            children: vec![],
            diagnostics: vec![],
            location: mock_loc(),
        })
    }

    fn compile(nodes: Vec<TemplateNode>, registry: &BindTargetRegistry) -> BindDocument {
        let mut doc = BindDocument {
            file_path: "Test.razor".to_string(),
            nodes,
        };
        match_bind_attributes(&mut doc, registry);
        lower_document(&mut doc, registry, &ExpansionOptions::default());
        doc
    }

    fn attributes(node: &TemplateNode) -> &[AttributeNode] {
        match node {
            TemplateNode::Element(el) => &el.attributes,
            TemplateNode::Component(c) => &c.attributes,
            _ => panic!("expected a tag"),
        }
    }

    fn generated(node: &TemplateNode) -> Vec<&GeneratedAttribute> {
        attributes(node)
            .iter()
            .filter_map(|a| match a {
                AttributeNode::Generated(g) => Some(g),
                _ => None,
            })
            .collect()
    }

    fn usage(name: &str, content: Vec<ContentFragment>, target: BindTarget) -> BindUsage {
        BindUsage {
            attribute_name: name.to_string(),
            content,
            target: Some(target),
            location: mock_loc(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // NAME PARSING
    // ═══════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_parse_bind_names() {
        let bare = parse_bind_attribute_name("bind").unwrap();
        assert_eq!((bare.value, bare.change), (None, None));

        let one = parse_bind_attribute_name("bind-value").unwrap();
        assert_eq!((one.value, one.change), (Some("value"), None));

        let two = parse_bind_attribute_name("bind-value-onblur").unwrap();
        assert_eq!((two.value, two.change), (Some("value"), Some("onblur")));
    }

    #[test]
    fn test_parse_bind_names_rejects_bad_shapes() {
        assert!(parse_bind_attribute_name("bind-a-b-c").is_none());
        assert!(parse_bind_attribute_name("bind-").is_none());
        assert!(parse_bind_attribute_name("bind--x").is_none());
        assert!(parse_bind_attribute_name("bind-value-").is_none());
        assert!(parse_bind_attribute_name("binding").is_none());
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SCENARIOS
    // ═══════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_bare_bind_on_text_input() {
        let registry = input_registry();
        let doc = compile(
            vec![element("input", vec![html("type", "text"), html("bind", "@X")])],
            &registry,
        );

        let out = generated(&doc.nodes[0]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name, "value");
        assert_eq!(out[0].expression, "ReadValue(X)");
        assert_eq!(out[1].name, "changed");
        assert_eq!(out[1].expression, "WriteValueHandler((__value) => X = __value, X)");
        assert!(out[0].property.is_none());
    }

    #[test]
    fn test_explicit_value_on_text_input_matches_same_target() {
        let registry = input_registry();
        let doc = compile(
            vec![element("input", vec![html("type", "text"), html("bind-value", "@X")])],
            &registry,
        );

        let names: Vec<&str> = attributes(&doc.nodes[0]).iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["type", "value", "changed"]);
    }

    #[test]
    fn test_component_bind_uses_typed_callback() {
        let registry = input_registry();
        let doc = compile(
            vec![component("MyComponent", vec![html("bind-Value", "@Y")])],
            &registry,
        );

        let out = generated(&doc.nodes[0]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name, "Value");
        assert_eq!(out[0].expression, "ReadValue(Y)");
        assert_eq!(out[0].property.as_ref().unwrap().type_name, "int");
        assert_eq!(out[1].name, "ValueChanged");
        assert_eq!(out[1].expression, "(__value) => Y = __value");
        assert_eq!(out[1].property.as_ref().unwrap().type_name, "Action<int>");
    }

    #[test]
    fn test_component_without_changed_property_is_dropped() {
        let registry = input_registry();
        let doc = compile(
            vec![component("PlainComponent", vec![html("bind-Value", "@Y")])],
            &registry,
        );
        assert!(attributes(&doc.nodes[0]).is_empty());
    }

    #[test]
    fn test_four_segment_name_is_dropped() {
        let registry = input_registry();
        let doc = compile(
            vec![element(
                "input",
                vec![html("type", "text"), html("bind-a-b-c", "@X"), html("class", "wide")],
            )],
            &registry,
        );

        let names: Vec<&str> = attributes(&doc.nodes[0]).iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["type", "class"]);
    }

    #[test]
    fn test_complex_content_reports_and_siblings_expand() {
        let registry = input_registry();
        let mut doc = BindDocument {
            file_path: "Test.razor".to_string(),
            nodes: vec![element(
                "input",
                vec![
                    html("type", "checkbox"),
                    html("bind-value-onblur", "a @X b @Y"),
                    html("bind", "@Done"),
                ],
            )],
        };
        match_bind_attributes(&mut doc, &registry);
        let report = lower_document(&mut doc, &registry, &ExpansionOptions::default());

        assert_eq!(report.removed, 1);
        assert_eq!(report.expanded, 1);
        assert_eq!(report.diagnostics.len(), 1);

        match &doc.nodes[0] {
            TemplateNode::Element(el) => {
                assert_eq!(el.diagnostics.len(), 1);
                assert_eq!(el.diagnostics[0].kind, DiagnosticKind::UnsupportedComplexContent);
                assert_eq!(el.diagnostics[0].attribute_name, "bind-value-onblur");
                let names: Vec<&str> = el.attributes.iter().map(|a| a.name()).collect();
                assert_eq!(names, vec!["type", "checked", "changed"]);
            }
            _ => unreachable!(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // RESOLUTION AND VALIDATION
    // ═══════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_fully_qualified_name_on_element() {
        let registry = input_registry();
        let doc = compile(
            vec![element("div", vec![html("bind-title-onblur", "@(Model.Title)")])],
            &registry,
        );
        let out = generated(&doc.nodes[0]);
        assert_eq!(out[0].name, "title");
        assert_eq!(out[0].expression, "ReadValue(Model.Title)");
        assert_eq!(out[1].name, "onblur");
        assert_eq!(
            out[1].expression,
            "WriteValueHandler((__value) => Model.Title = __value, Model.Title)"
        );
    }

    #[test]
    fn test_fallback_with_single_segment_on_element_is_unresolvable() {
        let registry = input_registry();
        let outcome = lower_usage(
            &usage("bind-title", vec![ContentFragment::expression("X")], BindTarget::fallback()),
            TagKind::Element,
            &registry,
            &ExpansionOptions::default(),
        );
        assert_eq!(outcome, LoweringOutcome::Dropped(DropReason::Unresolvable));
    }

    #[test]
    fn test_component_change_name_inferred() {
        let registry = input_registry();
        let mut target = BindTarget::component("MyComponent", "Value", "ValueChanged");
        target.change_attribute = None;
        let outcome = lower_usage(
            &usage("bind", vec![ContentFragment::expression("Y")], target),
            TagKind::Component("MyComponent"),
            &registry,
            &ExpansionOptions::default(),
        );
        match outcome {
            LoweringOutcome::Expanded { value, change } => {
                assert_eq!(value.name, "Value");
                assert_eq!(change.name, "ValueChanged");
                assert_eq!(change.expression, "(__value) => Y = __value");
            }
            other => panic!("expected expansion, got {:?}", other),
        }
    }

    #[test]
    fn test_fallback_pair_on_component_expands() {
        let registry = input_registry();
        let doc = compile(
            vec![component("MyComponent", vec![html("bind-Value-ValueChanged", "@Y")])],
            &registry,
        );

        let out = generated(&doc.nodes[0]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name, "Value");
        assert_eq!(out[0].expression, "ReadValue(Y)");
        assert_eq!(out[0].property.as_ref().unwrap().type_name, "int");
        assert_eq!(out[1].name, "ValueChanged");
        assert_eq!(out[1].expression, "(__value) => Y = __value");
        assert!(out[1].property.as_ref().unwrap().type_name.starts_with("Action"));
    }

    #[test]
    fn test_fallback_on_component_infers_declared_change() {
        let registry = input_registry();
        let outcome = lower_usage(
            &usage("bind-Value", vec![ContentFragment::expression("Y")], BindTarget::fallback()),
            TagKind::Component("MyComponent"),
            &registry,
            &ExpansionOptions::default(),
        );
        match outcome {
            LoweringOutcome::Expanded { value, change } => {
                assert_eq!(value.name, "Value");
                assert_eq!(change.name, "ValueChanged");
                assert!(change.property.is_some());
            }
            other => panic!("expected expansion, got {:?}", other),
        }
    }

    #[test]
    fn test_fallback_on_component_needs_declared_pair() {
        let registry = input_registry();
        for (name, component_type) in [
            ("bind-Value-OnCommit", "MyComponent"),
            ("bind-ValueChanged-Value", "MyComponent"),
            ("bind-Other", "MyComponent"),
            ("bind-Value", "PlainComponent"),
            ("bind-Value", "UnknownComponent"),
        ] {
            let outcome = lower_usage(
                &usage(name, vec![ContentFragment::expression("Y")], BindTarget::fallback()),
                TagKind::Component(component_type),
                &registry,
                &ExpansionOptions::default(),
            );
            assert_eq!(
                outcome,
                LoweringOutcome::Dropped(DropReason::Unresolvable),
                "{} on {}",
                name,
                component_type
            );
        }
    }

    #[test]
    fn test_component_explicit_change_without_property_uses_write_helper() {
        let registry = input_registry();
        let outcome = lower_usage(
            &usage(
                "bind-Value-OnCommit",
                vec![ContentFragment::expression("Y")],
                BindTarget::component("MyComponent", "Value", "ValueChanged"),
            ),
            TagKind::Component("MyComponent"),
            &registry,
            &ExpansionOptions::default(),
        );
        match outcome {
            LoweringOutcome::Expanded { value, change } => {
                assert!(value.property.is_some());
                assert_eq!(change.name, "OnCommit");
                assert!(change.property.is_none());
                assert_eq!(change.expression, "WriteValueHandler((__value) => Y = __value, Y)");
            }
            other => panic!("expected expansion, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_content_dropped_without_diagnostic() {
        let registry = input_registry();
        let doc = compile(
            vec![element("input", vec![html("type", "text"), html("bind", "")])],
            &registry,
        );
        match &doc.nodes[0] {
            TemplateNode::Element(el) => {
                assert_eq!(el.attributes.len(), 1);
                assert!(el.diagnostics.is_empty());
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_literal_expression_content_is_accepted() {
        let registry = input_registry();
        let outcome = lower_usage(
            &usage(
                "bind",
                vec![ContentFragment::literal("Model.Name")],
                BindTarget::from_fact(&BindTargetFact::new("input", Some("text"), "value", "changed")),
            ),
            TagKind::Element,
            &registry,
            &ExpansionOptions::default(),
        );
        assert!(matches!(outcome, LoweringOutcome::Expanded { .. }));
    }

    #[test]
    fn test_single_fragment_with_many_tokens_is_complex() {
        let registry = input_registry();
        let outcome = lower_usage(
            &usage(
                "bind",
                vec![ContentFragment::literal("one two")],
                BindTarget::from_fact(&BindTargetFact::new("input", Some("text"), "value", "changed")),
            ),
            TagKind::Element,
            &registry,
            &ExpansionOptions::default(),
        );
        match outcome {
            LoweringOutcome::Removed(diag) => assert!(diag.message.contains("one two")),
            other => panic!("expected removal, got {:?}", other),
        }
    }

    #[test]
    fn test_unmatched_usage_dropped() {
        let registry = input_registry();
        let mut unbound = usage("bind", vec![ContentFragment::expression("X")], BindTarget::fallback());
        unbound.target = None;
        let outcome = lower_usage(&unbound, TagKind::Element, &registry, &ExpansionOptions::default());
        assert_eq!(outcome, LoweringOutcome::Dropped(DropReason::Unmatched));
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // DUPLICATE SUPPRESSION
    // ═══════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_fallback_duplicate_suppressed() {
        let text_target =
            BindTarget::from_fact(&BindTargetFact::new("input", Some("text"), "value", "changed"));
        let attrs = vec![
            AttributeNode::BindUsage(usage(
                "bind-value",
                vec![ContentFragment::expression("X")],
                BindTarget::fallback(),
            )),
            html("class", "wide"),
            AttributeNode::BindUsage(usage("bind", vec![ContentFragment::expression("X")], text_target)),
        ];

        let (kept, suppressed) = suppress_duplicates(attrs);
        assert_eq!(suppressed, 1);
        let names: Vec<&str> = kept.iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["class", "bind"]);
    }

    #[test]
    fn test_fallback_kept_without_specific_match() {
        let attrs = vec![
            AttributeNode::BindUsage(usage(
                "bind-title-onblur",
                vec![ContentFragment::expression("X")],
                BindTarget::fallback(),
            )),
            AttributeNode::BindUsage(usage(
                "bind-value",
                vec![ContentFragment::expression("Y")],
                BindTarget::fallback(),
            )),
        ];
        let (kept, suppressed) = suppress_duplicates(attrs);
        assert_eq!(suppressed, 0);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_matched_pair_expands_once() {
        let registry = BindTargetRegistry::build(
            &collect_facts(&[], true),
            &[],
            &ExpansionOptions::default(),
        );
        let mut doc = BindDocument {
            file_path: "Test.razor".to_string(),
            nodes: vec![element("input", vec![html("type", "checkbox"), html("bind-checked", "@Done")])],
        };
        assert_eq!(match_bind_attributes(&mut doc, &registry), 2);
        let report = lower_document(&mut doc, &registry, &ExpansionOptions::default());
        assert_eq!(report.expanded, 1);
        assert_eq!(report.suppressed, 1);
        let names: Vec<&str> = attributes(&doc.nodes[0]).iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["type", "checked", "changed"]);
    }

    #[test]
    fn test_nested_tags_are_lowered() {
        let registry = input_registry();
        let inner = element("input", vec![html("type", "text"), html("bind", "@Inner")]);
        let outer = TemplateNode::Element(ElementNode {
            tag: "form".to_string(),
            attributes: vec![],
            children: vec![inner, component("MyComponent", vec![html("bind-Value", "@Count")])],
            diagnostics: vec![],
            location: mock_loc(),
        });
        let doc = compile(vec![outer], &registry);
        match &doc.nodes[0] {
            TemplateNode::Element(form) => {
                assert_eq!(generated(&form.children[0]).len(), 2);
                assert_eq!(generated(&form.children[1])[1].name, "ValueChanged");
            }
            _ => unreachable!(),
        }
    }
}
