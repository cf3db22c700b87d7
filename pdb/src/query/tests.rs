//! Tests for the query algebra and filter parser.

use super::*;

fn bracket_balance(rendered: &str) -> bool {
    let mut depth = 0i64;
    let mut in_string = false;
    let mut escaped = false;
    for c in rendered.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0 && !in_string
}

fn sample_trees() -> Vec<Predicate> {
    vec![
        Predicate::machine("web01.example.net"),
        Predicate::fact("domain", "example.net"),
        Predicate::fact_present("ec2_metadata"),
        Predicate::resource("Class", "Nginx"),
        Predicate::not(Predicate::resource("File", "/etc/motd")),
        Predicate::and([
            Predicate::or([
                Predicate::fact("osfamily", "Debian"),
                FactMatch::new("kernel", "^Linux").operator("~").into(),
            ])
            .unwrap(),
            Predicate::not(
                Predicate::and([
                    Predicate::machine("db01"),
                    ResourceMatch::new("Nagios_host", "db01").exported(true).into(),
                ])
                .unwrap(),
            ),
            Predicate::fact_present("fqdn"),
        ])
        .unwrap(),
    ]
}

// Leaves, machine context

#[test]
fn test_machine_match_machine_context() {
    assert_eq!(Predicate::machine("x").render_machine(), r#"["=","name","x"]"#);
}

#[test]
fn test_machine_match_fact_context() {
    assert_eq!(Predicate::machine("x").render_fact(), r#"["=","certname","x"]"#);
}

#[test]
fn test_machine_match_custom_operator() {
    let p: Predicate = MachineMatch::new("^web").operator("~").into();
    assert_eq!(p.render_machine(), r#"["~","name","^web"]"#);
    assert_eq!(p.render_fact(), r#"["~","certname","^web"]"#);
}

#[test]
fn test_fact_match_machine_context() {
    assert_eq!(
        Predicate::fact("domain", "example.net").render_machine(),
        r#"["=",["fact","domain"],"example.net"]"#
    );
}

#[test]
fn test_fact_match_fact_context_is_subquery() {
    assert_eq!(
        Predicate::fact("domain", "example.net").render_fact(),
        r#"["in","certname",["extract","certname",["select_facts",["and",["=","name","domain"],["=","value","example.net"]]]]]"#
    );
}

#[test]
fn test_fact_name_presence() {
    let p = Predicate::fact_present("ec2_metadata");
    assert_eq!(p.render_fact(), r#"["=","name","ec2_metadata"]"#);
    assert_eq!(
        p.render_machine(),
        r#"["in","name",["extract","certname",["select_facts",["=","name","ec2_metadata"]]]]"#
    );
}

// Resources always go through a sub-query

#[test]
fn test_resource_machine_context() {
    assert_eq!(
        Predicate::resource("Class", "Nginx").render_machine(),
        r#"["in","name",["extract","certname",["select_resources",["and",["=","type","Class"],["=","title","Nginx"],["=","exported",false]]]]]"#
    );
}

#[test]
fn test_resource_fact_context() {
    assert_eq!(
        Predicate::resource("Class", "Nginx").render_fact(),
        r#"["in","certname",["extract","certname",["select_resources",["and",["=","type","Class"],["=","title","Nginx"],["=","exported",false]]]]]"#
    );
}

#[test]
fn test_resource_exported_with_regex_title() {
    let p: Predicate = ResourceMatch::new("Nagios_host", "^web")
        .exported(true)
        .operator("~")
        .into();
    assert_eq!(
        p.render_name_value().unwrap(),
        r#"["and",["=","type","Nagios_host"],["~","title","^web"],["=","exported",true]]"#
    );
}

#[test]
fn test_synthesize_subquery_fields() {
    let resource = ResourceMatch::new("User", "deploy");
    assert_eq!(
        synthesize_subquery(&resource, "select_resources", "certname", "certname"),
        r#"["in","certname",["extract","certname",["select_resources",["and",["=","type","User"],["=","title","deploy"],["=","exported",false]]]]]"#
    );
    assert_eq!(
        synthesize_subquery(&resource, "select_resources", "certname", "name"),
        r#"["in","name",["extract","certname",["select_resources",["and",["=","type","User"],["=","title","deploy"],["=","exported",false]]]]]"#
    );
}

#[test]
fn test_subquery_constants_match_resource_rendering() {
    let resource = ResourceMatch::new("User", "deploy");
    let p = Predicate::Resource(resource.clone());
    assert_eq!(
        p.render_machine(),
        Subquery::RESOURCES_FOR_NODES.wrap(&resource).to_string()
    );
    assert_eq!(
        p.render_fact(),
        Subquery::RESOURCES_FOR_FACTS.wrap(&resource).to_string()
    );
}

// Name-value filters

#[test]
fn test_fact_name_value_filter() {
    let p: Predicate = FactMatch::new("operatingsystem", "Ubuntu").operator("~").into();
    assert_eq!(
        p.render_name_value().unwrap(),
        r#"["and",["=","name","operatingsystem"],["~","value","Ubuntu"]]"#
    );
}

#[test]
fn test_name_value_unsupported() {
    assert!(matches!(
        Predicate::machine("x").render_name_value(),
        Err(crate::Error::Unsupported(_))
    ));
    assert!(matches!(
        Predicate::and([Predicate::fact("a", "b")]).unwrap().render_name_value(),
        Err(crate::Error::Unsupported(_))
    ));
    assert!(matches!(
        Predicate::not(Predicate::fact("a", "b")).render_name_value(),
        Err(crate::Error::Unsupported(_))
    ));
}

// Connectives

#[test]
fn test_or_of_facts() {
    let p = Predicate::or([
        Predicate::fact("fqdn", "node1.example.net"),
        Predicate::fact("fqdn", "node2.example.net"),
        Predicate::fact("fqdn", "node3.example.net"),
    ])
    .unwrap();
    assert_eq!(
        p.render_machine(),
        r#"["or",["=",["fact","fqdn"],"node1.example.net"],["=",["fact","fqdn"],"node2.example.net"],["=",["fact","fqdn"],"node3.example.net"]]"#
    );
}

#[test]
fn test_and_of_facts() {
    let p = Predicate::and([
        Predicate::fact("domain", "example.net"),
        FactMatch::new("operatingsystem", "Ubuntu").operator("~").into(),
    ])
    .unwrap();
    assert_eq!(
        p.render_machine(),
        r#"["and",["=",["fact","domain"],"example.net"],["~",["fact","operatingsystem"],"Ubuntu"]]"#
    );
}

#[test]
fn test_not_fact() {
    let p = Predicate::not(Predicate::fact("fqdn", "node2.example.net"));
    assert_eq!(
        p.render_machine(),
        r#"["not",["=",["fact","fqdn"],"node2.example.net"]]"#
    );
}

#[test]
fn test_connective_structural_law() {
    let p1 = Predicate::fact("domain", "example.net");
    let p2 = Predicate::resource("Class", "Nginx");
    for context in [Context::Machine, Context::Fact] {
        let and = Predicate::and([p1.clone(), p2.clone()]).unwrap();
        assert_eq!(
            and.render(context),
            format!(r#"["and",{},{}]"#, p1.render(context), p2.render(context))
        );

        let or = Predicate::or([p1.clone(), p2.clone()]).unwrap();
        assert_eq!(
            or.render(context),
            format!(r#"["or",{},{}]"#, p1.render(context), p2.render(context))
        );

        let not = Predicate::not(p2.clone());
        assert_eq!(not.render(context), format!(r#"["not",{}]"#, p2.render(context)));
    }
}

#[test]
fn test_connective_fact_context_recurses_in_fact_context() {
    // Children keep the connective's context at every depth.
    let p = Predicate::or([Predicate::not(Predicate::machine("db01"))]).unwrap();
    assert_eq!(p.render_fact(), r#"["or",["not",["=","certname","db01"]]]"#);
    assert_eq!(p.render_machine(), r#"["or",["not",["=","name","db01"]]]"#);
}

#[test]
fn test_empty_connectives_rejected() {
    assert!(matches!(
        Predicate::and(Vec::<Predicate>::new()),
        Err(crate::Error::EmptyConnective("and"))
    ));
    assert!(matches!(
        Predicate::or(std::iter::empty::<Predicate>()),
        Err(crate::Error::EmptyConnective("or"))
    ));
}

// Grammar properties

#[test]
fn test_renders_are_balanced() {
    for tree in sample_trees() {
        for context in [Context::Machine, Context::Fact] {
            let rendered = tree.render(context);
            assert!(bracket_balance(&rendered), "unbalanced: {}", rendered);
            assert!(serde_json::from_str::<serde_json::Value>(&rendered).is_ok());
        }
    }
}

#[test]
fn test_render_is_reuse_safe() {
    for tree in sample_trees() {
        let machine = tree.render_machine();
        let fact = tree.render_fact();
        assert_eq!(tree.render_machine(), machine);
        assert_eq!(tree.render_fact(), fact);
        assert_eq!(tree.render_machine(), machine);
    }
}

#[test]
fn test_values_are_json_quoted_only() {
    let p = Predicate::fact("motd", r#"say "hi" \o/ & more"#);
    assert_eq!(
        p.render_machine(),
        r#"["=",["fact","motd"],"say \"hi\" \\o/ & more"]"#
    );
}

#[test]
fn test_unknown_operator_passes_through() {
    let p: Predicate = FactMatch::new("uptime_days", "30").operator("bogus").into();
    assert_eq!(p.render_machine(), r#"["bogus",["fact","uptime_days"],"30"]"#);
}

// Filter parser

#[test]
fn test_parse_empty_filter() {
    assert_eq!(parse_filter("").unwrap(), None);
    assert_eq!(parse_filter("   ").unwrap(), None);
}

#[test]
fn test_parse_bare_node() {
    assert_eq!(
        parse_filter("web01.example.net").unwrap(),
        Some(Predicate::machine("web01.example.net"))
    );
}

#[test]
fn test_parse_bare_node_starting_with_name() {
    assert_eq!(
        parse_filter("nameserver01").unwrap(),
        Some(Predicate::machine("nameserver01"))
    );
}

#[test]
fn test_parse_name_operators() {
    assert_eq!(
        parse_filter("name=db01").unwrap(),
        Some(Predicate::machine("db01"))
    );
    assert_eq!(
        parse_filter("name~^web").unwrap(),
        Some(MachineMatch::new("^web").operator("~").into())
    );
}

#[test]
fn test_parse_fact_operators() {
    assert_eq!(
        parse_filter("fact:osfamily=Debian").unwrap(),
        Some(Predicate::fact("osfamily", "Debian"))
    );
    assert_eq!(
        parse_filter("fact:memorysize_mb>=2048").unwrap(),
        Some(FactMatch::new("memorysize_mb", "2048").operator(">=").into())
    );
    assert_eq!(
        parse_filter("fact:kernel~^Linux").unwrap(),
        Some(FactMatch::new("kernel", "^Linux").operator("~").into())
    );
}

#[test]
fn test_parse_has() {
    assert_eq!(
        parse_filter("has:ec2_metadata").unwrap(),
        Some(Predicate::fact_present("ec2_metadata"))
    );
}

#[test]
fn test_parse_resources() {
    assert_eq!(
        parse_filter("resource:Class[Nginx]").unwrap(),
        Some(Predicate::resource("Class", "Nginx"))
    );
    assert_eq!(
        parse_filter("@@resource:Nagios_host[web01]").unwrap(),
        Some(ResourceMatch::new("Nagios_host", "web01").exported(true).into())
    );
    assert_eq!(
        parse_filter("resource:File~[^/etc/]").unwrap(),
        Some(ResourceMatch::new("File", "^/etc/").operator("~").into())
    );
}

#[test]
fn test_parse_resource_title_with_spaces() {
    assert_eq!(
        parse_filter("resource:Exec[apt-get update] has:fqdn").unwrap(),
        Predicate::and([
            Predicate::resource("Exec", "apt-get update"),
            Predicate::fact_present("fqdn"),
        ])
        .ok()
    );
}

#[test]
fn test_parse_negation_and_alternatives() {
    assert_eq!(
        parse_filter("!fact:osfamily=RedHat").unwrap(),
        Some(Predicate::not(Predicate::fact("osfamily", "RedHat")))
    );
    assert_eq!(
        parse_filter("web01|web02|!db01").unwrap(),
        Predicate::or([
            Predicate::machine("web01"),
            Predicate::machine("web02"),
            Predicate::not(Predicate::machine("db01")),
        ])
        .ok()
    );
}

#[test]
fn test_parse_multiple_terms_render() {
    let p = parse_filter("fact:domain=example.net fact:operatingsystem~Ubuntu")
        .unwrap()
        .unwrap();
    assert_eq!(
        p.render_machine(),
        r#"["and",["=",["fact","domain"],"example.net"],["~",["fact","operatingsystem"],"Ubuntu"]]"#
    );
}

#[test]
fn test_parse_errors() {
    for input in [
        "!",
        "fact:osfamily",
        "fact:=Debian",
        "fact:osfamily=",
        "has:",
        "resource:Class",
        "resource:Class[Nginx",
        "resource:[Nginx]",
        "name=",
        "web01||web02",
        "weird:thing",
        "--context",
        "resource:Class[Nginx] -f",
    ] {
        assert!(
            matches!(parse_filter(input), Err(crate::Error::Parse(_))),
            "expected parse error for {:?}",
            input
        );
    }
}

#[test]
fn test_parse_regex_alternation_stays_in_value() {
    assert_eq!(
        parse_filter("fact:kernel~Linux|BSD").unwrap(),
        Some(FactMatch::new("kernel", "Linux|BSD").operator("~").into())
    );
    assert_eq!(
        parse_filter("name~^web|^db").unwrap(),
        Some(MachineMatch::new("^web|^db").operator("~").into())
    );
    assert_eq!(
        parse_filter("fact:kernel~Linux|BSD").unwrap().unwrap().render_machine(),
        r#"["~",["fact","kernel"],"Linux|BSD"]"#
    );
}

#[test]
fn test_parse_alternatives_after_comparison() {
    assert_eq!(
        parse_filter("fact:kernel~Linux|has:bsd_version").unwrap(),
        Predicate::or([
            FactMatch::new("kernel", "Linux").operator("~").into(),
            Predicate::fact_present("bsd_version"),
        ])
        .ok()
    );
    assert_eq!(
        parse_filter("fact:osfamily=Debian|!name=db01").unwrap(),
        Predicate::or([
            Predicate::fact("osfamily", "Debian"),
            Predicate::not(Predicate::machine("db01")),
        ])
        .ok()
    );
}
