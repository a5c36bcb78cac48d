//! Pass 依赖图
//!
//! 把依赖边折叠成 petgraph 的 DAG，便于查询前驱 / 后继与拓扑顺序。

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::dependency::DependencyEdge;

/// 边数据：同一对 Pass 之间涉及的全部资源
#[derive(Clone, Debug, Default)]
pub struct PassEdge {
    pub resources: Vec<String>,
}

pub struct PassGraph {
    /// 节点存储 pass 索引
    graph: DiGraph<usize, PassEdge>,
    /// Pass 索引到图节点的映射
    node_indices: Vec<NodeIndex>,
}

impl PassGraph {
    /// 构建依赖图，每对 producer / consumer 只保留一条边
    pub fn build(pass_count: usize, edges: &[DependencyEdge]) -> Self {
        let mut graph = DiGraph::with_capacity(pass_count, edges.len());
        let node_indices: Vec<NodeIndex> = (0..pass_count).map(|i| graph.add_node(i)).collect();
        let mut pass_graph = Self { graph, node_indices };

        for edge in edges {
            pass_graph.add_edge(edge.source_pass_index, edge.target_pass_index, &edge.resource_id);
        }
        pass_graph
    }

    fn add_edge(&mut self, producer: usize, consumer: usize, resource: &str) {
        let (Some(&producer), Some(&consumer)) = (self.node_indices.get(producer), self.node_indices.get(consumer))
        else {
            log::trace!("dependency edge {} -> {} refers to an unknown pass", producer, consumer);
            return;
        };

        // 已存在边时合并资源
        match self.graph.find_edge(producer, consumer) {
            Some(edge) => {
                if let Some(data) = self.graph.edge_weight_mut(edge)
                    && !data.resources.iter().any(|r| r == resource)
                {
                    data.resources.push(resource.to_string());
                }
            }
            None => {
                self.graph.add_edge(
                    producer,
                    consumer,
                    PassEdge {
                        resources: vec![resource.to_string()],
                    },
                );
            }
        }
    }
}

// getter & query
impl PassGraph {
    #[inline]
    pub fn pass_count(&self) -> usize {
        self.node_indices.len()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// 拓扑排序
    ///
    /// # 返回
    /// - `Ok(order)`: 拓扑排序后的 Pass 索引列表
    /// - `Err(pass)`: 检测到循环依赖，返回循环中的一个 Pass
    pub fn topological_order(&self) -> Result<Vec<usize>, usize> {
        toposort(&self.graph, None)
            .map(|nodes| nodes.into_iter().map(|n| self.graph[n]).collect())
            .map_err(|cycle| self.graph[cycle.node_id()])
    }

    /// 直接依赖的 Pass（升序）
    pub fn predecessors(&self, pass_index: usize) -> Vec<usize> {
        self.neighbors(pass_index, Direction::Incoming)
    }

    /// 直接读取该 Pass 输出的 Pass（升序）
    pub fn successors(&self, pass_index: usize) -> Vec<usize> {
        self.neighbors(pass_index, Direction::Outgoing)
    }

    /// 两个 Pass 之间涉及的资源
    pub fn edge_resources(&self, producer: usize, consumer: usize) -> Option<&[String]> {
        let producer = *self.node_indices.get(producer)?;
        let consumer = *self.node_indices.get(consumer)?;
        let edge = self.graph.find_edge(producer, consumer)?;
        self.graph.edge_weight(edge).map(|data| data.resources.as_slice())
    }

    /// 输出没有被之后任何 Pass 读取的 Pass
    pub fn sink_passes(&self) -> Vec<usize> {
        self.node_indices
            .iter()
            .filter(|&&node| self.graph.neighbors_directed(node, Direction::Outgoing).next().is_none())
            .map(|&node| self.graph[node])
            .collect()
    }

    fn neighbors(&self, pass_index: usize, direction: Direction) -> Vec<usize> {
        let Some(&node) = self.node_indices.get(pass_index) else {
            return Vec::new();
        };
        let mut neighbors: Vec<usize> = self.graph.neighbors_directed(node, direction).map(|n| self.graph[n]).collect();
        neighbors.sort_unstable();
        neighbors
    }
}
