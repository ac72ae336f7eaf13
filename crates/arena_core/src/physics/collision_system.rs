//! Collision world
//!
//! Owns every tracked object together with the chunk grid that indexes them.
//! The grid only stores ids; each object owns its shape and the set of cells
//! it occupies. Queries run in two phases:
//!
//! - broad phase: candidate ids from the grid cells under the probe bounds;
//! - narrow phase: exact shape tests and the caller's filter.
//!
//! Results come back in registration order, which is stable across slot
//! reuse and independent of hash ordering.

use crate::core::config::GridConfig;
use crate::foundation::collections::{new_key_type, SlotMap};
use crate::foundation::math::{utils, Transform2D, Vec2};
use crate::physics::collision::{
    Aabb, Collidable, CollisionShape, Contact, Shape, ShapeView, CONTACT_EPSILON,
};
use crate::physics::collision_layers::CollisionLayers;
use crate::spatial::{CellMembership, ChunkGrid, GridError, MembershipChange, SpatialQuery};

new_key_type! {
    /// Stable handle of a tracked object
    pub struct ObjectId;
}

/// Team number used to tell friend from foe
pub type TeamId = u32;

/// Errors raised by world mutations
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum WorldError {
    /// No live object has this id
    #[error("Unknown object {0:?}")]
    UnknownObject(ObjectId),

    /// Position or rotation was NaN or infinite
    #[error("Non-finite transform: position {position:?}, rotation {rotation}")]
    NonFiniteTransform {
        /// Rejected position
        position: Vec2,
        /// Rejected rotation
        rotation: f32,
    },

    /// The grid could not be built
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Everything needed to spawn an object
#[derive(Debug, Clone)]
pub struct ObjectDesc {
    /// Model-space shape
    pub shape: CollisionShape,
    /// Initial pose
    pub transform: Transform2D,
    /// Layer membership
    pub layers: CollisionLayers,
    /// Owning team, if any
    pub team: Option<TeamId>,
}

impl ObjectDesc {
    /// Shape at the origin with no layers and no team
    pub fn new(shape: CollisionShape) -> Self {
        Self {
            shape,
            transform: Transform2D::identity(),
            layers: CollisionLayers::empty(),
            team: None,
        }
    }

    /// Sets the initial position
    pub fn at(mut self, position: Vec2) -> Self {
        self.transform.position = position;
        self
    }

    /// Sets the initial rotation
    pub fn rotated(mut self, rotation: f32) -> Self {
        self.transform.rotation = rotation;
        self
    }

    /// Sets the layers
    pub fn layers(mut self, layers: CollisionLayers) -> Self {
        self.layers = layers;
        self
    }

    /// Sets the team
    pub fn team(mut self, team: TeamId) -> Self {
        self.team = Some(team);
        self
    }
}

/// An object known to the world
#[derive(Debug, Clone)]
pub struct TrackedObject {
    shape: Shape,
    layers: CollisionLayers,
    team: Option<TeamId>,
    cells: CellMembership,
    sequence: u64,
}

impl TrackedObject {
    /// Posed shape
    pub const fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Layer membership
    pub const fn layers(&self) -> CollisionLayers {
        self.layers
    }

    /// Owning team
    pub const fn team(&self) -> Option<TeamId> {
        self.team
    }

    /// Cells currently occupied
    pub const fn cells(&self) -> &CellMembership {
        &self.cells
    }

    /// Registration order; lower spawned earlier
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Current position
    pub const fn position(&self) -> Vec2 {
        self.shape.position()
    }
}

/// Declarative object filter for queries
///
/// An object passes when it is on at least one of `layers` (or `layers` is
/// empty), is not on `exclude_team` and is not `exclude`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QueryFilter {
    /// Required layers (any of); empty accepts every layer
    pub layers: CollisionLayers,
    /// Objects on this team are skipped
    pub exclude_team: Option<TeamId>,
    /// This object is skipped
    pub exclude: Option<ObjectId>,
}

impl QueryFilter {
    /// Accepts everything
    pub fn any() -> Self {
        Self::default()
    }

    /// Objects on any of `layers`
    pub fn on_layers(layers: CollisionLayers) -> Self {
        Self {
            layers,
            ..Self::default()
        }
    }

    /// Placed structures
    pub fn structures() -> Self {
        Self::on_layers(CollisionLayers::STRUCTURE)
    }

    /// Movement obstacles
    pub fn obstacles() -> Self {
        Self::on_layers(CollisionLayers::OBSTACLE)
    }

    /// Attackable objects that are not on `team`
    pub fn attackable_enemies_of(team: TeamId) -> Self {
        Self {
            layers: CollisionLayers::ATTACKABLE,
            exclude_team: Some(team),
            exclude: None,
        }
    }

    /// Also skips `id`
    pub fn excluding(mut self, id: ObjectId) -> Self {
        self.exclude = Some(id);
        self
    }

    /// Whether `object` (with id `id`) passes
    pub fn matches(&self, id: ObjectId, object: &TrackedObject) -> bool {
        (self.layers.is_empty() || object.layers.intersects(self.layers))
            && (self.exclude_team.is_none() || object.team != self.exclude_team)
            && self.exclude != Some(id)
    }
}

/// Tracked objects plus their spatial index
pub struct CollisionWorld {
    grid: ChunkGrid<ObjectId>,
    objects: SlotMap<ObjectId, TrackedObject>,
    next_sequence: u64,
}

impl CollisionWorld {
    /// Creates an empty world with grid cells of edge `cell_size`
    pub fn new(cell_size: f32) -> Result<Self, WorldError> {
        Ok(Self {
            grid: ChunkGrid::new(cell_size)?,
            objects: SlotMap::with_key(),
            next_sequence: 0,
        })
    }

    /// Creates an empty world from configuration
    pub fn from_config(config: &GridConfig) -> Result<Self, WorldError> {
        Self::new(config.cell_size)
    }

    /// Adds an object and registers it in every cell it overlaps
    pub fn spawn(&mut self, desc: ObjectDesc) -> Result<ObjectId, WorldError> {
        check_transform(desc.transform.position, desc.transform.rotation)?;

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let id = self.objects.insert(TrackedObject {
            shape: Shape::with_transform(desc.shape, desc.transform),
            layers: desc.layers,
            team: desc.team,
            cells: CellMembership::new(),
            sequence,
        });

        if let Some(object) = self.objects.get_mut(id) {
            let change = self.grid.register(id, &object.shape, &mut object.cells);
            log::debug!("Spawned {id:?} in {} cells", change.added);
        }
        Ok(id)
    }

    /// Removes an object and releases its cells
    ///
    /// Unknown or already removed ids are ignored; returns whether anything
    /// was removed.
    pub fn despawn(&mut self, id: ObjectId) -> bool {
        match self.objects.remove(id) {
            Some(mut object) => {
                self.grid.unregister(id, &mut object.cells);
                log::debug!("Despawned {id:?}");
                true
            }
            None => false,
        }
    }

    /// Moves an object and updates its cell membership incrementally
    pub fn set_transform(
        &mut self,
        id: ObjectId,
        position: Vec2,
        rotation: f32,
    ) -> Result<MembershipChange, WorldError> {
        check_transform(position, rotation)?;
        let object = self
            .objects
            .get_mut(id)
            .ok_or(WorldError::UnknownObject(id))?;
        object.shape.set_transformation(position, rotation);
        Ok(self.grid.update_membership(id, &object.shape, &mut object.cells))
    }

    /// Replaces the layer set of an object
    pub fn set_layers(&mut self, id: ObjectId, layers: CollisionLayers) -> Result<(), WorldError> {
        let object = self
            .objects
            .get_mut(id)
            .ok_or(WorldError::UnknownObject(id))?;
        object.layers = layers;
        Ok(())
    }

    /// Looks up an object
    pub fn get(&self, id: ObjectId) -> Option<&TrackedObject> {
        self.objects.get(id)
    }

    /// Whether `id` is alive
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// No live objects
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Live objects in registration order
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &TrackedObject)> {
        let mut all: Vec<_> = self.objects.iter().collect();
        all.sort_unstable_by_key(|(_, object)| object.sequence);
        all.into_iter()
    }

    /// Spatial index
    pub const fn grid(&self) -> &ChunkGrid<ObjectId> {
        &self.grid
    }

    /// Objects overlapping `probe` that pass `filter`, in registration order
    pub fn shape_query(&self, probe: &dyn Collidable, filter: &QueryFilter) -> Vec<ObjectId> {
        self.shape_query_by(probe, |id, object| filter.matches(id, object))
    }

    /// Objects overlapping `probe` accepted by `predicate`, in registration order
    pub fn shape_query_by<P>(&self, probe: &dyn Collidable, mut predicate: P) -> Vec<ObjectId>
    where
        P: FnMut(ObjectId, &TrackedObject) -> bool,
    {
        let probe_view = probe.view();
        self.collect_ordered(&probe.bounds(), |id, object| {
            predicate(id, object) && probe_view.intersects(&object.shape)
        })
    }

    /// Objects whose shape contains `point`, in registration order
    pub fn point_query(&self, point: Vec2, filter: &QueryFilter) -> Vec<ObjectId> {
        if !utils::is_finite(point) {
            return Vec::new();
        }
        // Widened so a point on a cell edge also sees the neighbouring cell
        let area = Aabb::new(point, point).expanded(CONTACT_EPSILON);
        self.collect_ordered(&area, |id, object| {
            filter.matches(id, object) && object.shape.contains_point(point)
        })
    }

    /// True iff `probe` overlaps any object on [`CollisionLayers::OBSTACLE`]
    pub fn restriction_query(&self, probe: &dyn Collidable) -> bool {
        let probe_view = probe.view();
        self.grid.candidates(&probe.bounds()).into_iter().any(|id| {
            self.objects.get(id).map_or(false, |object| {
                object.layers.is_obstacle() && probe_view.intersects(&object.shape)
            })
        })
    }

    /// Every object penetrating `id` with its contact, in registration order
    ///
    /// Contact normals point from the other object toward `id`, so moving
    /// `id` by [`Contact::resolution`] separates the pair.
    pub fn contacts(
        &self,
        id: ObjectId,
        filter: &QueryFilter,
    ) -> Result<Vec<(ObjectId, Contact)>, WorldError> {
        let object = self.objects.get(id).ok_or(WorldError::UnknownObject(id))?;
        let filter = filter.excluding(id);

        let mut contacts: Vec<(u64, ObjectId, Contact)> = self
            .grid
            .candidates(&object.shape.bounds())
            .into_iter()
            .filter_map(|other_id| {
                let other = self.objects.get(other_id)?;
                if !filter.matches(other_id, other) {
                    return None;
                }
                let contact = object.shape.intersect(&other.shape)?;
                Some((other.sequence, other_id, contact))
            })
            .collect();
        contacts.sort_unstable_by_key(|(sequence, ..)| *sequence);
        Ok(contacts.into_iter().map(|(_, id, contact)| (id, contact)).collect())
    }

    /// Removes every object
    pub fn clear(&mut self) {
        self.objects.clear();
        self.grid.clear();
    }

    fn collect_ordered<P>(&self, bounds: &Aabb, mut accept: P) -> Vec<ObjectId>
    where
        P: FnMut(ObjectId, &TrackedObject) -> bool,
    {
        let mut found: Vec<(u64, ObjectId)> = self
            .grid
            .candidates(bounds)
            .into_iter()
            .filter_map(|id| {
                let object = self.objects.get(id)?;
                accept(id, object).then_some((object.sequence, id))
            })
            .collect();
        found.sort_unstable_by_key(|(sequence, _)| *sequence);
        found.into_iter().map(|(_, id)| id).collect()
    }
}

impl SpatialQuery for CollisionWorld {
    fn restriction_query(&self, probe: &dyn Collidable) -> bool {
        CollisionWorld::restriction_query(self, probe)
    }
}

fn check_transform(position: Vec2, rotation: f32) -> Result<(), WorldError> {
    if utils::is_finite(position) && rotation.is_finite() {
        Ok(())
    } else {
        log::warn!("Rejecting non-finite transform {position:?} / {rotation}");
        Err(WorldError::NonFiniteTransform { position, rotation })
    }
}

impl Collidable for TrackedObject {
    fn view(&self) -> ShapeView<'_> {
        self.shape.view()
    }
}
