use std::sync::Arc;
use std::time::Duration;

use super::registers::BlockExtractor;
use super::registers::ContractCreationFilter;
use super::registers::TransactionSplitter;
use super::*;
use crate::config::RouterConfig;
use crate::core::Network;
use crate::core::PathMode;
use crate::core::RegisterType;
use crate::EtlError;
use crate::test_utils::FakeChain;

fn source() -> SharedComponent {
    Arc::new(Extractor::new(
        RegisterType::Block,
        ExtractorSettings {
            network: Network::Layer1,
            mode: PathMode::Live,
            poll_interval: Duration::from_millis(100),
            start_height: None,
            end_height: None,
            max_retries: 0,
        },
        Box::new(BlockExtractor::new(Network::Layer1, Arc::new(FakeChain::new(1)))),
        &RouterConfig::default(),
    ))
}

fn splitter() -> SharedComponent {
    Arc::new(Transform::new(
        RegisterType::Transaction,
        TransactionSplitter::construct().unwrap(),
        &RouterConfig::default(),
    ))
}

fn filter() -> SharedComponent {
    Arc::new(Transform::new(
        RegisterType::ContractCreationTx,
        ContractCreationFilter::construct().unwrap(),
        &RouterConfig::default(),
    ))
}

#[test]
fn components_keep_insertion_order() {
    let mut graph = ComponentGraph::new();
    let (a, b, c) = (source(), splitter(), filter());
    graph.add_component(a.clone()).unwrap();
    graph.add_component(b.clone()).unwrap();
    graph.add_component(c.clone()).unwrap();
    graph.add_edge(a.id(), b.id()).unwrap();
    graph.add_edge(b.id(), c.id()).unwrap();

    let ids: Vec<_> = graph.components().iter().map(|c| c.id().clone()).collect();
    assert_eq!(ids, vec![a.id().clone(), b.id().clone(), c.id().clone()]);
    assert_eq!(graph.terminal().unwrap().id(), c.id());
    assert_eq!(graph.downstream(a.id()), &[b.id().clone()]);
    assert!(graph.downstream(c.id()).is_empty());
    assert!(a.router().has_route(b.id().as_str()));
    assert_eq!(graph.len(), 3);
}

#[test]
fn adding_a_component_twice_fails() {
    let mut graph = ComponentGraph::new();
    let a = source();
    graph.add_component(a.clone()).unwrap();

    let err = graph.add_component(a.clone()).unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("component with ID {} already exists in dag", a.id())
    );
}

#[test]
fn edge_to_unknown_component_fails() {
    let mut graph = ComponentGraph::new();
    let a = source();
    let stranger = splitter();
    graph.add_component(a.clone()).unwrap();

    let err = graph.add_edge(a.id(), stranger.id()).unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("component with ID {} does not exist within dag", stranger.id())
    );
}

#[test]
fn duplicate_edge_fails() {
    let mut graph = ComponentGraph::new();
    let (a, b) = (source(), splitter());
    graph.add_component(a.clone()).unwrap();
    graph.add_component(b.clone()).unwrap();
    graph.add_edge(a.id(), b.id()).unwrap();

    let err = graph.add_edge(a.id(), b.id()).unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("edge already exists from ({}) to ({}) in dag", a.id(), b.id())
    );
}

#[test]
fn edge_into_a_source_fails() {
    let mut graph = ComponentGraph::new();
    let (a, b) = (splitter(), source());
    graph.add_component(a.clone()).unwrap();
    graph.add_component(b.clone()).unwrap();

    let err = graph.add_edge(a.id(), b.id()).unwrap_err();
    assert!(matches!(err, crate::Error::Etl(EtlError::NoInput(_))));
}
