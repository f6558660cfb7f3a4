//! Comparison tests between the static and dynamic neighbor indices and a linear scan

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use crate::agent::{Agent, AgentStore, Neighbor};
    use crate::config::IndexChoice;
    use crate::geometry::Bound;
    use crate::neighbors::{DynamicAgentIndex, NeighborIndex, StaticAgentIndex};

    fn world() -> Bound {
        Bound::new(Vec2::ZERO, Vec2::new(50.0, 30.0))
    }

    /// Helper to build both indices over the same world
    fn setup_indices() -> (StaticAgentIndex, DynamicAgentIndex) {
        let static_index = StaticAgentIndex::new(IndexChoice::STATIC.static_config(&world()).unwrap()).unwrap();
        let dynamic_index = DynamicAgentIndex::new(IndexChoice::DYNAMIC.dynamic_config(&world()).unwrap(), 0.25).unwrap();
        (static_index, dynamic_index)
    }

    fn ids(index: &dyn NeighborIndex, region: &Bound) -> Vec<usize> {
        let mut out = Vec::new();
        index.neighbors(region, &mut out);
        let mut ids: Vec<usize> = out.iter().map(|neighbor| neighbor.id).collect();
        ids.sort_unstable();
        ids
    }

    fn linear_scan(agents: &[Agent], region: &Bound) -> Vec<usize> {
        agents
            .iter()
            .filter(|agent| region.contains_point(agent.position))
            .map(|agent| agent.id)
            .collect()
    }

    fn drift(agents: &mut [Agent], rng: &mut StdRng) {
        let half = world().half_extents;
        for agent in agents {
            let step = Vec2::new(rng.random_range(-1.5..1.5), rng.random_range(-1.5..1.5));
            agent.position = (agent.position + step).clamp(-half, half);
        }
    }

    #[test]
    fn test_basic_query_consistency() {
        let mut store = AgentStore::new();
        let _ = store.push(Vec2::new(1.0, 1.0), Vec2::X);
        let _ = store.push(Vec2::new(2.5, 1.0), Vec2::Y);
        let _ = store.push(Vec2::new(-10.0, 4.0), Vec2::NEG_X);
        let _ = store.push(Vec2::new(1.0, 2.0), Vec2::NEG_Y);

        let (mut static_index, mut dynamic_index) = setup_indices();
        assert_eq!(static_index.sync(store.as_slice()), 0);
        assert_eq!(dynamic_index.sync(store.as_slice()), 0);

        let region = Bound::around(Vec2::new(1.0, 1.0), 1.5);
        assert_eq!(ids(&static_index, &region), vec![0, 1, 3]);
        assert_eq!(ids(&dynamic_index, &region), vec![0, 1, 3]);

        let mut out = Vec::new();
        dynamic_index.neighbors(&Bound::around(Vec2::new(-10.0, 4.0), 0.5), &mut out);
        assert_eq!(
            out,
            vec![Neighbor {
                id: 2,
                position: Vec2::new(-10.0, 4.0),
                heading: Vec2::NEG_X,
            }],
            "neighbor snapshot carries position and heading"
        );
    }

    #[test]
    fn test_empty_query_consistency() {
        let (mut static_index, mut dynamic_index) = setup_indices();
        assert_eq!(static_index.sync(&[]), 0);
        assert_eq!(dynamic_index.sync(&[]), 0);
        let region = Bound::around(Vec2::ZERO, 100.0);
        assert!(ids(&static_index, &region).is_empty(), "static index returned unexpected results");
        assert!(ids(&dynamic_index, &region).is_empty(), "dynamic index returned unexpected results");
    }

    #[test]
    fn test_large_dataset_consistency() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut store = AgentStore::spawn(1500, &world(), &mut rng);
        let (mut static_index, mut dynamic_index) = setup_indices();

        for round in 0..10 {
            assert_eq!(static_index.sync(store.as_slice()), 0);
            assert_eq!(dynamic_index.sync(store.as_slice()), 0, "round {round}: nothing escapes the root");

            for _ in 0..50 {
                let center = Vec2::new(rng.random_range(-55.0..55.0), rng.random_range(-35.0..35.0));
                let region = Bound::around(center, rng.random_range(0.5..8.0));
                let expected = linear_scan(store.as_slice(), &region);
                assert_eq!(ids(&static_index, &region), expected, "static, round {round}, region {region:?}");
                assert_eq!(ids(&dynamic_index, &region), expected, "dynamic, round {round}, region {region:?}");
            }
            drift(store.as_mut_slice(), &mut rng);
        }
        assert_eq!(dynamic_index.tree().len(), store.len(), "one tracked item per agent");
    }

    #[test]
    fn test_clustered_dataset_consistency() {
        // Dense clusters stress leaf capacity and minimum node size.
        let mut rng = StdRng::seed_from_u64(43);
        let mut store = AgentStore::new();
        for cluster in [Vec2::new(-20.0, -10.0), Vec2::new(15.0, 12.0), Vec2::ZERO] {
            for _ in 0..400 {
                let offset = Vec2::new(rng.random_range(-0.8..0.8), rng.random_range(-0.8..0.8));
                let _ = store.push(cluster + offset, Vec2::X);
            }
        }
        let (mut static_index, mut dynamic_index) = setup_indices();
        let _ = static_index.sync(store.as_slice());
        let _ = dynamic_index.sync(store.as_slice());

        for center in [Vec2::new(-20.0, -10.0), Vec2::new(15.5, 11.5), Vec2::new(0.3, -0.2), Vec2::new(5.0, 5.0)] {
            let region = Bound::around(center, 0.6);
            let expected = linear_scan(store.as_slice(), &region);
            assert_eq!(ids(&static_index, &region), expected);
            assert_eq!(ids(&dynamic_index, &region), expected);
        }
    }

    #[test]
    fn test_wrapped_agents_stay_consistent() {
        let mut store = AgentStore::new();
        let id = store.push(Vec2::new(49.9, 0.0), Vec2::X);
        let (mut static_index, mut dynamic_index) = setup_indices();
        let _ = static_index.sync(store.as_slice());
        let _ = dynamic_index.sync(store.as_slice());

        // Teleport across the world, as the toroidal wrap does.
        store.as_mut_slice()[id].position = Vec2::new(-50.0, 0.0);
        assert_eq!(static_index.sync(store.as_slice()), 0);
        assert_eq!(dynamic_index.sync(store.as_slice()), 0);

        let west = Bound::around(Vec2::new(-50.0, 0.0), 0.5);
        let east = Bound::around(Vec2::new(50.0, 0.0), 0.5);
        assert_eq!(ids(&static_index, &west), vec![id]);
        assert_eq!(ids(&dynamic_index, &west), vec![id]);
        assert!(ids(&dynamic_index, &east).is_empty(), "no stale entry at the old edge");
    }
}
