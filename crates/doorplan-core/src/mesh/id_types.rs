slotmap::new_key_type! { pub struct VertexId; }
slotmap::new_key_type! { pub struct HalfEdgeId; }
slotmap::new_key_type! { pub struct FaceId; }
slotmap::new_key_type! { pub struct RoomId; }
