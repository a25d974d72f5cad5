use nabu_engine::coords::{Rect, Viewport};
use nabu_engine::logging::{init_logging, LoggingConfig};
use nabu_engine::paint::Color;
use nabu_engine::render::{
    CustomDrawCtx, QueueId, RecordingBackend, RenderError, Renderer, RendererConfig,
    SubmissionKind,
};
use nabu_engine::scene::{
    CustomCommand, GroupCommand, Material, MaterialId, QuadCommand, Quad, TextureId, Vertex,
};

// ── helpers ───────────────────────────────────────────────────────────────

fn mat(texture: u32) -> MaterialId {
    Material::sprite(TextureId(texture)).id()
}

/// Quad tagged through its x position so draw order is observable in the vertex stream.
fn tagged(z: i32, material: MaterialId, tag: u32) -> QuadCommand {
    let quad = Quad::solid(Rect::new(tag as f32, 0.0, 1.0, 1.0), Color::white());
    QuadCommand::new(z, material, quad)
}

fn renderer(capacity: usize) -> Renderer {
    init_logging(LoggingConfig::for_tests());
    Renderer::new(RendererConfig::default().with_batch_capacity(capacity)).unwrap()
}

/// Tags of every drawn quad in submission order.
fn drawn_tags(backend: &RecordingBackend) -> Vec<u32> {
    backend
        .batches()
        .flat_map(|s| s.vertices.chunks(4))
        .map(|quad| quad[0].position[0] as u32)
        .collect()
}

fn render(r: &mut Renderer) -> RecordingBackend {
    let mut backend = RecordingBackend::new();
    r.render(&mut backend).unwrap();
    backend
}

// ── ordering ──────────────────────────────────────────────────────────────

#[test]
fn distinct_nonzero_keys_render_ascending_regardless_of_insertion() {
    let mut r = renderer(64);
    let keys = [7, -3, 12, -40, 1, -1, 99, -8];
    for (tag, z) in keys.iter().enumerate() {
        // distinct materials so every quad is its own submission
        r.add_command(tagged(*z, mat(tag as u32), tag as u32)).unwrap();
    }
    let backend = render(&mut r);

    let drawn_keys: Vec<i32> = drawn_tags(&backend).iter().map(|&t| keys[t as usize]).collect();
    assert_eq!(drawn_keys, vec![-40, -8, -3, -1, 1, 7, 12, 99]);
}

#[test]
fn zero_keys_render_in_insertion_order() {
    let mut r = renderer(64);
    for tag in [0, 1, 2] {
        r.add_command(tagged(0, mat(1), tag)).unwrap();
    }
    let backend = render(&mut r);
    assert_eq!(drawn_tags(&backend), vec![0, 1, 2]);
}

#[test]
fn equal_nonzero_keys_keep_insertion_order() {
    let mut r = renderer(64);
    let zs = [5, -2, 5, -2, 5, -2];
    for (tag, z) in zs.iter().enumerate() {
        r.add_command(tagged(*z, mat(1), tag as u32)).unwrap();
    }
    let backend = render(&mut r);
    assert_eq!(drawn_tags(&backend), vec![1, 3, 5, 0, 2, 4]);
}

#[test]
fn negative_before_zero_before_positive_for_interleaved_insertion() {
    let mut r = renderer(64);
    let zs = [1, 0, -1, 0, 2, -2, 0];
    for (tag, z) in zs.iter().enumerate() {
        r.add_command(tagged(*z, mat(1), tag as u32)).unwrap();
    }
    let backend = render(&mut r);

    let order: Vec<i32> = drawn_tags(&backend).iter().map(|&t| zs[t as usize]).collect();
    assert_eq!(order, vec![-2, -1, 0, 0, 0, 1, 2]);
    // and the zeros are in insertion order
    assert_eq!(&drawn_tags(&backend)[2..5], &[1, 3, 6]);
}

// ── batching ──────────────────────────────────────────────────────────────

#[test]
fn same_material_run_is_one_submission() {
    let mut r = renderer(64);
    for tag in 0..10 {
        r.add_command(tagged(0, mat(1), tag)).unwrap();
    }
    let backend = render(&mut r);
    assert_eq!(backend.submissions().len(), 1);
    assert_eq!(backend.submissions()[0].quad_count(), 10);
    assert_eq!(backend.submissions()[0].indices.len(), 60);
    assert_eq!(r.drawn_batches(), 1);
    assert_eq!(r.drawn_vertices(), 40);
}

#[test]
fn capacity_plus_one_quads_take_two_submissions() {
    const CAP: usize = 16;
    let mut r = renderer(CAP);
    for tag in 0..=CAP as u32 {
        r.add_command(tagged(0, mat(1), tag)).unwrap();
    }
    let backend = render(&mut r);

    assert_eq!(backend.submissions().len(), 2);
    assert_eq!(backend.submissions()[0].quad_count(), CAP);
    assert_eq!(backend.submissions()[1].quad_count(), 1);
    assert_eq!(r.drawn_batches(), 2);
    assert_eq!(drawn_tags(&backend), (0..=CAP as u32).collect::<Vec<_>>());
}

#[test]
fn no_submission_ever_exceeds_capacity() {
    const CAP: usize = 5;
    let mut r = renderer(CAP);
    for tag in 0..23 {
        r.add_command(tagged(0, mat(tag / 9), tag)).unwrap();
    }
    let backend = render(&mut r);
    assert!(backend.submissions().iter().all(|s| s.quad_count() <= CAP));
    assert_eq!(drawn_tags(&backend).len(), 23);
}

#[test]
fn material_break_is_not_looked_past() {
    let mut r = renderer(64);
    r.add_command(tagged(0, mat(1), 0)).unwrap();
    r.add_command(tagged(0, mat(2), 1)).unwrap();
    r.add_command(tagged(0, mat(1), 2)).unwrap();
    let backend = render(&mut r);

    assert_eq!(backend.materials(), vec![mat(1), mat(2), mat(1)]);
    assert_eq!(r.drawn_batches(), 3);
}

#[test]
fn batching_follows_paint_order_not_insertion_order() {
    // Inserted as M1, M2, M1 but keys put both M1 quads next to each other.
    let mut r = renderer(64);
    r.add_command(tagged(1, mat(1), 0)).unwrap();
    r.add_command(tagged(0, mat(2), 1)).unwrap();
    r.add_command(tagged(1, mat(1), 2)).unwrap();
    let backend = render(&mut r);

    assert_eq!(backend.materials(), vec![mat(2), mat(1)]);
    assert_eq!(drawn_tags(&backend), vec![1, 0, 2]);
}

#[test]
fn vertex_count_is_conserved_across_batched_and_custom_draws() {
    let mut r = renderer(3);
    let triangle = [Vertex::default(); 3];
    for tag in 0..7 {
        r.add_command(tagged(tag as i32 % 3 - 1, mat(tag % 2), tag)).unwrap();
    }
    r.add_command(CustomCommand::new(0, move |ctx: &mut CustomDrawCtx<'_>| {
        ctx.draw_triangles(Material::solid().id(), &triangle, &[0, 1, 2])
    }))
    .unwrap();
    r.add_command(CustomCommand::new(-1, |ctx: &mut CustomDrawCtx<'_>| {
        ctx.add_drawn_batches(1);
        ctx.add_drawn_vertices(12);
        Ok(())
    }))
    .unwrap();

    let backend = render(&mut r);
    // 7 quads + one 3-vertex custom draw + 12 reported without submitting
    assert_eq!(r.drawn_vertices(), 7 * 4 + 3 + 12);
    assert_eq!(backend.total_vertices(), 7 * 4 + 3);
    let custom = backend.submissions().iter().filter(|s| s.kind == SubmissionKind::Triangles);
    assert_eq!(custom.count(), 1);
}

// ── groups ────────────────────────────────────────────────────────────────

#[test]
fn group_content_renders_at_the_group_command_position() {
    let mut r = renderer(64);
    r.add_command(tagged(0, mat(1), 0)).unwrap();
    let g = r.begin_group(0).unwrap();
    r.add_command(tagged(0, mat(2), 1)).unwrap();
    r.add_command(tagged(-5, mat(2), 2)).unwrap();
    r.end_group().unwrap();
    r.add_command(tagged(0, mat(1), 3)).unwrap();
    r.add_command(tagged(-1, mat(3), 4)).unwrap();

    assert_eq!(r.queue(g).unwrap().len(), 2);
    let backend = render(&mut r);
    // root: [4 (z=-1)] then [0, group(2, 1), 3]
    assert_eq!(drawn_tags(&backend), vec![4, 0, 2, 1, 3]);
}

#[test]
fn group_key_places_its_whole_subtree() {
    let mut r = renderer(64);
    r.add_command(tagged(0, mat(1), 0)).unwrap();
    r.begin_group(10).unwrap();
    r.add_command(tagged(-100, mat(2), 1)).unwrap();
    r.end_group().unwrap();
    r.add_command(tagged(5, mat(1), 2)).unwrap();

    let backend = render(&mut r);
    assert_eq!(drawn_tags(&backend), vec![0, 2, 1]);
}

#[test]
fn nested_groups_compose_depth_first() {
    let mut r = renderer(64);
    r.begin_group(0).unwrap();
    r.add_command(tagged(0, mat(1), 0)).unwrap();
    r.begin_group(-1).unwrap();
    r.add_command(tagged(0, mat(1), 1)).unwrap();
    r.end_group().unwrap();
    r.end_group().unwrap();
    r.add_command(tagged(0, mat(1), 2)).unwrap();

    let backend = render(&mut r);
    assert_eq!(drawn_tags(&backend), vec![1, 0, 2]);
    // one material all the way through: group boundaries do not break batches
    assert_eq!(backend.submissions().len(), 1);
}

#[test]
fn empty_group_contributes_nothing() {
    let mut r = renderer(64);
    r.add_command(tagged(0, mat(1), 0)).unwrap();
    let g = r.begin_group(0).unwrap();
    r.end_group().unwrap();
    r.add_command(tagged(0, mat(1), 1)).unwrap();

    // the group command itself is recorded in the parent
    assert_eq!(r.queue(QueueId::ROOT).unwrap().len(), 3);
    assert!(r.queue(g).unwrap().is_empty());

    let backend = render(&mut r);
    assert_eq!(backend.submissions().len(), 1);
    assert_eq!(r.drawn_vertices(), 8);
}

#[test]
fn push_pop_group_without_commands_leaves_parent_unchanged() {
    let mut r = renderer(64);
    r.add_command(tagged(0, mat(1), 0)).unwrap();
    let g = r.create_render_queue().unwrap();
    r.push_group(g).unwrap();
    assert_eq!(r.pop_group().unwrap(), g);
    assert_eq!(r.queue(QueueId::ROOT).unwrap().len(), 1);
}

#[test]
fn explicit_queue_target_bypasses_group_stack() {
    let mut r = renderer(64);
    let g = r.create_render_queue().unwrap();
    r.add_command(GroupCommand::new(0, g)).unwrap();
    r.push_group(g).unwrap();
    r.add_command_to(tagged(0, mat(1), 0), QueueId::ROOT).unwrap();
    r.add_command(tagged(0, mat(1), 1)).unwrap();
    r.pop_group().unwrap();

    assert_eq!(r.queue(QueueId::ROOT).unwrap().len(), 2);
    assert_eq!(r.queue(g).unwrap().len(), 1);
    let backend = render(&mut r);
    assert_eq!(drawn_tags(&backend), vec![1, 0]);
}

#[test]
fn pop_on_empty_stack_is_a_contract_violation() {
    let mut r = renderer(64);
    let err = r.pop_group().unwrap_err();
    assert!(err.is_contract_violation());
}

// ── frame lifecycle ───────────────────────────────────────────────────────

#[test]
fn clean_after_render_resets_stats_and_queues() {
    let mut r = renderer(64);
    let g = r.begin_group(0).unwrap();
    r.add_command(tagged(0, mat(1), 0)).unwrap();
    r.end_group().unwrap();
    r.add_command(tagged(3, mat(2), 1)).unwrap();
    render(&mut r);
    assert_eq!(r.drawn_batches(), 2);

    r.clean();
    assert_eq!(r.drawn_batches(), 0);
    assert_eq!(r.drawn_vertices(), 0);
    assert!(r.queue(QueueId::ROOT).unwrap().is_empty());
    assert!(r.queue(g).is_err());

    let backend = render(&mut r);
    assert!(backend.submissions().is_empty());
    assert_eq!(r.drawn_batches(), 0);
}

#[test]
fn queue_ids_recycle_across_frames() {
    let mut r = renderer(64);
    let first = r.create_render_queue().unwrap();
    let second = r.create_render_queue().unwrap();
    assert_ne!(first, second);
    render(&mut r);
    r.clean();
    assert_eq!(r.create_render_queue().unwrap(), first);
}

#[test]
fn commands_after_render_require_clean() {
    let mut r = renderer(64);
    render(&mut r);
    assert!(matches!(r.add_command(tagged(0, mat(1), 0)), Err(RenderError::Contract(_))));
    r.clean();
    assert!(r.add_command(tagged(0, mat(1), 0)).is_ok());
}

// ── culling ───────────────────────────────────────────────────────────────

fn scatter(r: &mut Renderer) {
    for tag in 0..6u32 {
        // every other quad sits far off screen
        let x = if tag % 2 == 0 { tag as f32 * 10.0 } else { 5000.0 };
        let quad = Quad::solid(Rect::new(x, 10.0, 8.0, 8.0), Color::white());
        r.add_command(QuadCommand::new(0, mat(1), quad)).unwrap();
    }
}

#[test]
fn culling_drops_offscreen_quads_only() {
    let config = RendererConfig::default().with_viewport(Viewport::new(320.0, 240.0));
    let mut r = Renderer::new(config).unwrap();
    scatter(&mut r);
    let backend = render(&mut r);

    assert_eq!(r.stats().culled_quads, 3);
    // culled quads leave the batch, not the statistics
    assert_eq!(r.drawn_vertices(), 24);
    assert_eq!(backend.total_vertices(), 12);
}

#[test]
fn culling_does_not_change_vertex_statistics() {
    let viewport = Viewport::new(100.0, 100.0);
    let on_screen = Quad::solid(Rect::new(10.0, 10.0, 8.0, 8.0), Color::white());
    let off_screen = Quad::solid(Rect::new(900.0, 10.0, 8.0, 8.0), Color::white());

    let mut stats = Vec::new();
    for culling in [true, false] {
        let config = RendererConfig::default().with_viewport(viewport).with_culling(culling);
        let mut r = Renderer::new(config).unwrap();
        r.add_command(QuadCommand::new(0, mat(1), on_screen)).unwrap();
        r.add_command(QuadCommand::new(0, mat(1), off_screen)).unwrap();
        render(&mut r);
        stats.push((r.drawn_vertices(), r.stats().culled_quads));
    }

    assert_eq!(stats, vec![(8, 1), (8, 0)]);
}

#[test]
fn disabling_culling_keeps_full_coverage() {
    let config = RendererConfig::default()
        .with_viewport(Viewport::new(320.0, 240.0))
        .with_culling(false);
    let mut culled_off = Renderer::new(config).unwrap();
    scatter(&mut culled_off);
    let backend = render(&mut culled_off);

    let mut no_viewport = Renderer::new(RendererConfig::default()).unwrap();
    scatter(&mut no_viewport);
    let reference = render(&mut no_viewport);

    assert_eq!(culled_off.stats().culled_quads, 0);
    assert_eq!(backend.submissions(), reference.submissions());
    assert_eq!(backend.total_vertices(), 24);
}

#[test]
fn model_view_is_applied_before_culling() {
    let config = RendererConfig::default().with_viewport(Viewport::new(100.0, 100.0));
    let mut r = Renderer::new(config).unwrap();
    let quad = Quad::solid(Rect::new(0.0, 0.0, 10.0, 10.0), Color::white());
    let away = glam::Mat4::from_translation(glam::Vec3::new(-500.0, 0.0, 0.0));
    r.add_command(QuadCommand::new(0, mat(1), quad).with_model_view(away)).unwrap();
    let shift = glam::Mat4::from_translation(glam::Vec3::new(20.0, 0.0, 0.0));
    r.add_command(QuadCommand::new(0, mat(1), quad).with_model_view(shift)).unwrap();

    let backend = render(&mut r);
    assert_eq!(r.stats().culled_quads, 1);
    assert_eq!(backend.submissions()[0].vertices[0].position, [20.0, 0.0, 0.0]);
}
