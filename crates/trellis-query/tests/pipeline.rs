//! Whole-pipeline tests: query text through compilation, rendering and
//! materialization against hand-built solution rows.

use serde_json::{json, Map as JsonMap, Value as Json};

use trellis_query::{materialize, render, RdfTerm, Rewriter, SolutionRow};

const SCHEMA: &str = "\
type Query {
  items: [Item]
  item: Item
  pickLists: [PickList]
}

type Item @object {
  name: String
  rank: Int
  fields: [Field]
  pickList: PickList
}

type Field {
  name: String
}

type PickList @object {
  name: String
}

type PickListOption {
  name: String
  pickList: PickList
}
";

fn context() -> Json {
    json!({
        "xsd": "http://www.w3.org/2001/XMLSchema#",
        "def": "https://example.org/definitions/",
        "name": { "@id": "def:name", "@type": "xsd:string" },
        "rank": { "@id": "def:rank", "@type": "xsd:integer" },
        "fields": { "@id": "def:fields", "@type": "@id" },
        "pickList": { "@id": "def:pickList", "@type": "@id" },
        "Item": "def:Item",
        "Field": "def:Field",
        "PickList": "def:PickList",
        "PickListOption": "def:PickListOption"
    })
}

fn rewriter() -> Rewriter {
    Rewriter::from_sources(SCHEMA, Some(&context()), None).unwrap()
}

fn compile(query: &str) -> trellis_query::SparqlPlan {
    rewriter().rewrite(query, &JsonMap::new()).unwrap()
}

fn uri(value: &str) -> RdfTerm {
    RdfTerm::Uri {
        value: value.to_string(),
    }
}

fn plain(value: &str) -> RdfTerm {
    RdfTerm::Literal {
        value: value.to_string(),
        datatype: None,
        lang: None,
    }
}

fn row(bindings: &[(&str, RdfTerm)]) -> SolutionRow {
    bindings
        .iter()
        .map(|(key, term)| (key.to_string(), term.clone()))
        .collect()
}

#[test]
fn renders_a_plural_root_selection() {
    let sparql = render(&compile("{ items { name } }"));
    insta::assert_snapshot!(sparql, @r#"
    PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
    PREFIX xsd: <http://www.w3.org/2001/XMLSchema#>
    SELECT * WHERE {
      ?items_node rdf:type <https://example.org/definitions/Item> .
      ?items_node <https://example.org/definitions/name> ?name_value .
    }
    "#);
}

#[test]
fn renders_a_terminal_scalar_filter() {
    let sparql = render(&compile(r#"{ items { name @filter(startsWith: "A") } }"#));
    insta::assert_snapshot!(sparql, @r#"
    PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
    PREFIX xsd: <http://www.w3.org/2001/XMLSchema#>
    SELECT * WHERE {
      ?items_node rdf:type <https://example.org/definitions/Item> .
      ?items_node <https://example.org/definitions/name> ?name_value .
      FILTER(STRSTARTS(?name_value, "A"))
    }
    "#);
}

#[test]
fn renders_the_wildcard_fragment_filter_combination() {
    let query = r#"
        {
          items {
            fields {
              state: _any {
                ... on PickListOption {
                  pickList(name: "MSR_Level")
                  name @filter(is: "L3")
                }
              }
            }
          }
        }
    "#;
    let plan = compile(query);
    insta::assert_snapshot!(render(&plan), @r#"
    PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
    PREFIX xsd: <http://www.w3.org/2001/XMLSchema#>
    SELECT * WHERE {
      ?items_node rdf:type <https://example.org/definitions/Item> .
      ?items_node <https://example.org/definitions/fields> ?fields_node .
      ?fields_node ?state_any ?state_node .
      ?state_node rdf:type <https://example.org/definitions/PickListOption> .
      ?state_node <https://example.org/definitions/pickList> ?pickList_node .
      ?pickList_node <https://example.org/definitions/name> "MSR_Level" .
      ?state_node <https://example.org/definitions/name> ?name_value .
      FILTER(?name_value = "L3")
    }
    "#);

    assert_eq!(
        plan.shape.to_json(),
        json!({
            "items": [{
                "$iri": "items_node",
                "fields": {
                    "$iri": "fields_node",
                    "state": {
                        "$any": "state_any",
                        "$iri": "state_node",
                        "pickList": { "$iri": "pickList_node" },
                        "name": "name_value"
                    }
                }
            }]
        })
    );
}

#[test]
fn renders_pagination_modifiers() {
    let sparql = render(&compile(
        "query @paginate(limit: 10, offset: 20, order: \"name_value\", desc: true) { items { name } }",
    ));
    insta::assert_snapshot!(sparql, @r#"
    PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
    PREFIX xsd: <http://www.w3.org/2001/XMLSchema#>
    SELECT * WHERE {
      ?items_node rdf:type <https://example.org/definitions/Item> .
      ?items_node <https://example.org/definitions/name> ?name_value .
    }
    ORDER BY DESC(?name_value)
    LIMIT 10
    OFFSET 20
    "#);
}

#[test]
fn plural_selection_materializes_one_entry_per_identity() {
    let plan = compile("{ items { name } }");
    let rows = vec![
        row(&[
            ("items_node", uri("https://example.org/items/1")),
            ("name_value", plain("A")),
        ]),
        row(&[
            ("items_node", uri("https://example.org/items/2")),
            ("name_value", plain("B")),
        ]),
    ];
    let mut errors = Vec::new();
    let data = materialize(&rows, &plan.shape, &mut errors);
    assert!(errors.is_empty());
    let items = data["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["name"], json!("A"));
    assert_eq!(items[1]["name"], json!("B"));
}

#[test]
fn singular_selection_with_two_identities_suggests_pluralizing() {
    let plan = compile("{ item { name } }");
    let rows = vec![
        row(&[
            ("item_node", uri("https://example.org/items/1")),
            ("name_value", plain("A")),
        ]),
        row(&[
            ("item_node", uri("https://example.org/items/2")),
            ("name_value", plain("B")),
        ]),
    ];
    let mut errors = Vec::new();
    materialize(&rows, &plan.shape, &mut errors);
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].message,
        "Multiple results encountered for top-level selector; did you mean to use `items` instead?"
    );
    assert_eq!(errors[0].binding_path.as_deref(), Some("item"));
}

#[test]
fn many_directive_collates_nested_divergence() {
    let plan = compile("{ items { pickList @many { name } } }");
    let rows = vec![
        row(&[
            ("items_node", uri("i")),
            ("pickList_node", uri("p1")),
            ("name_value", plain("One")),
        ]),
        row(&[
            ("items_node", uri("i")),
            ("pickList_node", uri("p2")),
            ("name_value", plain("Two")),
        ]),
    ];
    let mut errors = Vec::new();
    let data = materialize(&rows, &plan.shape, &mut errors);
    assert!(errors.is_empty());
    let pick_lists = data["items"][0]["pickList"].as_array().unwrap();
    assert_eq!(pick_lists.len(), 2);
    assert_eq!(pick_lists[0]["name"], json!("One"));
    assert_eq!(pick_lists[1]["name"], json!("Two"));
}

#[test]
fn hidden_fields_are_validated_but_suppressed() {
    let plan = compile("{ items { name @hide rank } }");
    let rows = vec![row(&[
        ("items_node", uri("i")),
        ("name_value", plain("secret")),
        (
            "rank_value",
            RdfTerm::Literal {
                value: "3".to_string(),
                datatype: Some("http://www.w3.org/2001/XMLSchema#integer".to_string()),
                lang: None,
            },
        ),
    ])];
    let mut errors = Vec::new();
    let data = materialize(&rows, &plan.shape, &mut errors);
    assert!(errors.is_empty());
    let item = &data["items"][0];
    assert!(item.get("name").is_none());
    assert_eq!(item["@hidden"], json!(["name"]));
    assert_eq!(item["rank"], json!(3));
}

#[test]
fn typename_round_trips_to_the_local_class_name() {
    let plan = compile("{ items { __typename name } }");
    let rows = vec![row(&[
        ("items_node", uri("i")),
        (
            "items_node_typename",
            uri("https://example.org/definitions/Item"),
        ),
        ("name_value", plain("A")),
    ])];
    let mut errors = Vec::new();
    let data = materialize(&rows, &plan.shape, &mut errors);
    assert_eq!(data["items"][0]["__typename"], json!("Item"));
}

#[test]
fn shape_references_stay_inside_the_pattern() {
    let queries = [
        "{ items { name } }",
        "{ item { name rank } }",
        "{ items { pickList @many { name } } }",
        "{ items { fields { _any { __typename } } } }",
        r#"{ items { name @filter(notEquals: "x") rank @filter(in: [1, 2]) } }"#,
        r#"{ items { fields { _any { ... on PickListOption { name } } } } }"#,
        "{ pickLists { name _hidden: name @hide } }",
    ];
    for query in queries {
        let plan = compile(query);
        let pattern_vars = plan.pattern_variables();
        for var in plan.shape.variables() {
            assert!(
                pattern_vars.contains(&var),
                "query {query} produced dangling shape variable {var}"
            );
        }
    }
}

#[test]
fn compiling_twice_yields_identical_plans() {
    let query = r#"{ items { name pickList(name: "L") fields { _any { __typename } } } }"#;
    assert_eq!(compile(query), compile(query));
    assert_eq!(render(&compile(query)), render(&compile(query)));
}

#[test]
fn spliced_list_variables_reach_the_filter() {
    let plan = rewriter()
        .rewrite(
            r#"query ($tags: [String]) { items { name @filter(in: $tags) } }"#,
            json!({ "tags": ["a", "b"] }).as_object().unwrap(),
        )
        .unwrap();
    let sparql = render(&plan);
    assert!(sparql.contains("FILTER(?name_value IN (\"a\", \"b\"))"));
}

#[test]
fn nonnull_int_variable_rejects_strings_before_compilation() {
    let error = rewriter()
        .rewrite(
            r#"query ($rank: Int!) { items { rank(is: $rank) } }"#,
            json!({ "rank": "three" }).as_object().unwrap(),
        )
        .unwrap_err();
    assert_eq!(
        error.to_string(),
        "Variable 'rank' expects a Int but the provided value was not of the correct type"
    );
}
