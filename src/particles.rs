use crate::domain::PeriodicDomain;
use crate::error::{Error, Result};
use nalgebra::SVector;
use rand::Rng;

/// Fixed-capacity particle store.
///
/// Active particles always form a contiguous prefix: slots `0..active_count()`
/// are occupied, every later slot up to `capacity()` is free. Deletion keeps
/// the prefix contiguous by moving the last active particle into the freed
/// slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSystem<const D: usize> {
    /// Positions of the active particles, one per occupied slot.
    positions: Vec<SVector<f64, D>>,
    /// Occupancy mask over every slot.
    occupied: Vec<bool>,
}

impl<const D: usize> ParticleSystem<D> {
    /// An empty system with room for `capacity` particles.
    pub fn new(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity),
            occupied: vec![false; capacity],
        }
    }

    /// Build a system from explicit positions.
    pub fn from_positions(positions: Vec<SVector<f64, D>>, capacity: usize) -> Result<Self> {
        if positions.len() > capacity {
            return Err(Error::config(format!(
                "{} initial particles exceed the capacity of {capacity}",
                positions.len()
            )));
        }
        let mut occupied = vec![false; capacity];
        occupied[..positions.len()].fill(true);
        Ok(Self {
            positions,
            occupied,
        })
    }

    /// Place `n` particles uniformly at random in the domain.
    pub fn random<R: Rng + ?Sized>(
        n: usize,
        capacity: usize,
        domain: &PeriodicDomain<D>,
        rng: &mut R,
    ) -> Result<Self> {
        if n > capacity {
            return Err(Error::config(format!(
                "requested {n} initial particles but the maximum is {capacity}"
            )));
        }
        let positions = (0..n).map(|_| domain.random_position(rng)).collect();
        Self::from_positions(positions, capacity)
    }

    pub fn active_count(&self) -> usize {
        self.positions.len()
    }

    pub fn capacity(&self) -> usize {
        self.occupied.len()
    }

    pub fn is_full(&self) -> bool {
        self.active_count() == self.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Positions of the active particles.
    pub fn positions(&self) -> &[SVector<f64, D>] {
        &self.positions
    }

    pub fn position(&self, index: usize) -> Option<&SVector<f64, D>> {
        self.positions.get(index)
    }

    /// Occupancy of every slot, active or not.
    pub fn occupancy(&self) -> &[bool] {
        &self.occupied
    }

    /// Independent copy of the active positions and the occupancy mask, used
    /// as the trial configuration of a move.
    pub fn snapshot(&self) -> Self {
        let mut positions = Vec::with_capacity(self.positions.len() + 1);
        positions.extend_from_slice(&self.positions);
        Self {
            positions,
            occupied: self.occupied.clone(),
        }
    }

    /// Teleport particle `index` to a uniformly sampled point of the domain.
    ///
    /// This resamples the whole box; it is not a local random-walk step.
    pub fn displace_trial<R: Rng + ?Sized>(
        mut self,
        index: usize,
        domain: &PeriodicDomain<D>,
        rng: &mut R,
    ) -> Self {
        self.positions[index] = domain.random_position(rng);
        self
    }

    /// Add a particle at a uniformly sampled point, in slot `active_count()`.
    ///
    /// Fails without touching the random stream when every slot is taken.
    pub fn insert_trial<R: Rng + ?Sized>(
        self,
        domain: &PeriodicDomain<D>,
        rng: &mut R,
    ) -> Result<(Self, usize)> {
        if self.is_full() {
            return Err(Error::CapacityExceeded {
                capacity: self.capacity(),
            });
        }
        let position = domain.random_position(rng);
        self.insert_at_trial(position)
    }

    /// Add a particle at a given position, in slot `active_count()`.
    pub fn insert_at_trial(mut self, position: SVector<f64, D>) -> Result<(Self, usize)> {
        if self.is_full() {
            return Err(Error::CapacityExceeded {
                capacity: self.capacity(),
            });
        }
        let index = self.positions.len();
        self.positions.push(position);
        self.occupied[index] = true;
        Ok((self, index))
    }

    /// Remove particle `index`: the last active particle moves into its slot
    /// and the former last slot is marked free.
    pub fn delete_trial(mut self, index: usize) -> Self {
        self.positions.swap_remove(index);
        let last = self.positions.len();
        self.occupied[last] = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn lattice_system(n: usize, capacity: usize) -> ParticleSystem<3> {
        let positions = (0..n)
            .map(|i| Vector3::new(i as f64, 0.5 * i as f64, 1.0))
            .collect();
        ParticleSystem::from_positions(positions, capacity).unwrap()
    }

    fn assert_contiguous(system: &ParticleSystem<3>) {
        let n = system.active_count();
        assert!(system.occupancy()[..n].iter().all(|&o| o));
        assert!(system.occupancy()[n..].iter().all(|&o| !o));
    }

    #[test]
    fn test_random_initialisation() {
        let domain = PeriodicDomain::new([10.0, 10.0, 10.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let system = ParticleSystem::random(50, 80, &domain, &mut rng).unwrap();
        assert_eq!(system.active_count(), 50);
        assert_eq!(system.capacity(), 80);
        assert_contiguous(&system);
    }

    #[test]
    fn test_random_initialisation_over_capacity() {
        let domain = PeriodicDomain::new([10.0, 10.0, 10.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let err = ParticleSystem::random(11, 10, &domain, &mut rng).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_snapshot_is_independent() {
        let domain = PeriodicDomain::new([10.0, 10.0, 10.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let live = lattice_system(4, 6);
        let trial = live.snapshot().displace_trial(2, &domain, &mut rng);
        assert_eq!(live.positions()[2], Vector3::new(2.0, 1.0, 1.0));
        assert_ne!(trial.positions()[2], live.positions()[2]);
        assert_eq!(trial.positions()[0], live.positions()[0]);
    }

    #[test]
    fn test_insert_uses_next_free_slot() {
        let domain = PeriodicDomain::new([10.0, 10.0, 10.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let (trial, index) = lattice_system(3, 5).insert_trial(&domain, &mut rng).unwrap();
        assert_eq!(index, 3);
        assert_eq!(trial.active_count(), 4);
        assert_contiguous(&trial);
    }

    #[test]
    fn test_insert_at_capacity_fails() {
        let domain = PeriodicDomain::new([10.0, 10.0, 10.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let err = lattice_system(3, 3)
            .insert_trial(&domain, &mut rng)
            .unwrap_err();
        assert!(matches!(err, Error::CapacityExceeded { capacity: 3 }));
    }

    #[test]
    fn test_delete_moves_last_into_slot() {
        let system = lattice_system(5, 8);
        let last = system.positions()[4];
        let trial = system.snapshot().delete_trial(1);
        assert_eq!(trial.active_count(), 4);
        assert_eq!(trial.positions()[1], last);
        assert_eq!(trial.positions()[0], system.positions()[0]);
        assert_eq!(trial.positions()[2], system.positions()[2]);
        assert_eq!(trial.positions()[3], system.positions()[3]);
        assert_contiguous(&trial);
    }

    #[test]
    fn test_delete_last_particle() {
        let trial = lattice_system(3, 3).delete_trial(2);
        assert_eq!(trial.active_count(), 2);
        assert_contiguous(&trial);
        let trial = trial.delete_trial(0).delete_trial(0);
        assert!(trial.is_empty());
        assert_contiguous(&trial);
    }
}
