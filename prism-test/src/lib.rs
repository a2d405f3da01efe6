//! Headless "test" backend.
//!
//! Implements the device/queue/command-buffer surface with no GPU behind it:
//! object creation hands out numbered handles, submissions append to a
//! journal, and waits succeed immediately. The object graph is deliberately
//! independent of the other backends (no shared base types beyond the
//! `prism` data model); it exists so a client render path and test harness
//! can run anywhere, and so contract violations (double-submitting a
//! one-time buffer, unbalanced semaphores) surface without a driver.

#[macro_use]
extern crate log;

use prism::command::{ClearValue, CommandBufferUsageFlags, DrawIndexedParams, DrawParams, Rect2D};
use prism::descriptor::DescriptorSetLayoutDescription;
use prism::limits::{DeviceFeatures, DeviceLimits};
use prism::pass::RenderPassDescription;
use prism::pipeline::ShaderStageFlags;
use prism::{Result, WaitResult};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

fn next_handle() -> u64 {
    NEXT_HANDLE.fetch_add(1, Ordering::Relaxed)
}

macro_rules! handle_type {
    ($name:ident) => {
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        pub struct $name(pub u64);
    };
}

handle_type!(TestBuffer);
handle_type!(TestImage);
handle_type!(TestImageView);
handle_type!(TestSampler);
handle_type!(TestShaderModule);
handle_type!(TestDescriptorSetLayout);
handle_type!(TestDescriptorSet);
handle_type!(TestPipelineLayout);
handle_type!(TestPipeline);
handle_type!(TestRenderPass);
handle_type!(TestFramebuffer);

/// What a submitted command buffer did, in recorded order.
#[derive(Clone, Debug, PartialEq)]
pub enum TestCmd {
    BindPipeline(TestPipeline),
    BindDescriptorSet { set_index: u32, set: TestDescriptorSet },
    BeginRenderPass { framebuffer: TestFramebuffer, render_area: Rect2D, clear_values: Vec<ClearValue> },
    EndRenderPass,
    Draw(DrawParams),
    DrawIndexed(DrawIndexedParams),
    Dispatch(u32, u32, u32),
}

#[derive(Clone, Debug, Default)]
pub struct Journal {
    pub objects_created: u64,
    pub submissions: Vec<Vec<TestCmd>>,
}

pub struct TestDevice {
    limits: DeviceLimits,
    features: DeviceFeatures,
    journal: Rc<RefCell<Journal>>,
}

impl TestDevice {
    pub fn new() -> TestDevice {
        info!("created headless test device");
        TestDevice {
            limits: DeviceLimits::default(),
            features: DeviceFeatures::default(),
            journal: Rc::new(RefCell::new(Journal::default())),
        }
    }

    pub fn limits(&self) -> &DeviceLimits {
        &self.limits
    }

    pub fn features(&self) -> &DeviceFeatures {
        &self.features
    }

    pub fn journal(&self) -> Journal {
        self.journal.borrow().clone()
    }

    fn created<T>(&self, make: impl FnOnce(u64) -> T) -> T {
        self.journal.borrow_mut().objects_created += 1;
        make(next_handle())
    }

    pub fn create_buffer(&self, _size: usize) -> TestBuffer {
        self.created(TestBuffer)
    }

    pub fn create_image(&self) -> TestImage {
        self.created(TestImage)
    }

    pub fn create_image_view(&self, _image: TestImage) -> TestImageView {
        self.created(TestImageView)
    }

    pub fn create_sampler(&self) -> TestSampler {
        self.created(TestSampler)
    }

    pub fn create_shader_module(&self, _data: &[u8], _stage: ShaderStageFlags) -> TestShaderModule {
        self.created(TestShaderModule)
    }

    pub fn create_descriptor_set_layout(
        &self,
        _description: &DescriptorSetLayoutDescription,
    ) -> TestDescriptorSetLayout {
        self.created(TestDescriptorSetLayout)
    }

    pub fn create_descriptor_set(&self, _layout: TestDescriptorSetLayout) -> TestDescriptorSet {
        self.created(TestDescriptorSet)
    }

    pub fn create_pipeline_layout(
        &self,
        _set_layouts: &[TestDescriptorSetLayout],
    ) -> TestPipelineLayout {
        self.created(TestPipelineLayout)
    }

    pub fn create_render_pass(&self, _description: &RenderPassDescription) -> TestRenderPass {
        self.created(TestRenderPass)
    }

    pub fn create_framebuffer(
        &self,
        _render_pass: TestRenderPass,
        _attachments: &[TestImageView],
    ) -> TestFramebuffer {
        self.created(TestFramebuffer)
    }

    pub fn create_pipeline(&self, _layout: TestPipelineLayout) -> TestPipeline {
        self.created(TestPipeline)
    }

    pub fn create_command_buffer(&self) -> TestCommandBuffer {
        TestCommandBuffer {
            recording: false,
            ended: false,
            usage: CommandBufferUsageFlags::empty(),
            commands: Vec::new(),
            submit_count: Cell::new(0),
        }
    }

    pub fn create_fence(&self) -> TestFence {
        TestFence {
            signaled: Cell::new(false),
        }
    }

    pub fn create_semaphore(&self) -> TestSemaphore {
        TestSemaphore {
            signaled: Cell::new(false),
        }
    }

    pub fn queue(&self) -> TestQueue {
        TestQueue {
            journal: self.journal.clone(),
        }
    }
}

impl Default for TestDevice {
    fn default() -> TestDevice {
        TestDevice::new()
    }
}

//--------------------------------------------------------------------------------------------------

pub struct TestCommandBuffer {
    recording: bool,
    ended: bool,
    usage: CommandBufferUsageFlags,
    commands: Vec<TestCmd>,
    submit_count: Cell<u64>,
}

impl TestCommandBuffer {
    pub fn begin(&mut self, usage: CommandBufferUsageFlags) {
        assert!(!self.recording, "begin() while already recording");
        self.recording = true;
        self.ended = false;
        self.usage = usage;
        self.commands.clear();
        self.submit_count.set(0);
    }

    pub fn end(&mut self) {
        assert!(self.recording, "end() without begin()");
        self.recording = false;
        self.ended = true;
    }

    fn push(&mut self, cmd: TestCmd) {
        debug_assert!(self.recording, "recording outside begin()/end()");
        self.commands.push(cmd);
    }

    pub fn bind_pipeline(&mut self, pipeline: TestPipeline) {
        self.push(TestCmd::BindPipeline(pipeline));
    }

    pub fn bind_descriptor_set(&mut self, set_index: u32, set: TestDescriptorSet) {
        self.push(TestCmd::BindDescriptorSet { set_index, set });
    }

    pub fn begin_render_pass(
        &mut self,
        framebuffer: TestFramebuffer,
        render_area: Rect2D,
        clear_values: &[ClearValue],
    ) {
        self.push(TestCmd::BeginRenderPass {
            framebuffer,
            render_area,
            clear_values: clear_values.to_vec(),
        });
    }

    pub fn end_render_pass(&mut self) {
        self.push(TestCmd::EndRenderPass);
    }

    pub fn draw(&mut self, params: DrawParams) {
        self.push(TestCmd::Draw(params));
    }

    pub fn draw_indexed(&mut self, params: DrawIndexedParams) {
        self.push(TestCmd::DrawIndexed(params));
    }

    pub fn dispatch(&mut self, x: u32, y: u32, z: u32) {
        self.push(TestCmd::Dispatch(x, y, z));
    }
}

pub struct TestQueue {
    journal: Rc<RefCell<Journal>>,
}

impl TestQueue {
    pub fn submit(
        &self,
        buffers: &[&TestCommandBuffer],
        wait_semaphores: &[&TestSemaphore],
        signal_semaphores: &[&TestSemaphore],
        fence: Option<&TestFence>,
    ) -> Result<()> {
        for s in wait_semaphores {
            debug_assert!(s.signaled.get(), "waiting on an unsignaled semaphore");
            s.signaled.set(false);
        }
        for cb in buffers {
            assert!(cb.ended, "submitted command buffer was not ended");
            debug_assert!(
                !cb.usage.contains(CommandBufferUsageFlags::ONE_TIME_SUBMIT)
                    || cb.submit_count.get() == 0,
                "one-time command buffer submitted twice without a reset"
            );
            cb.submit_count.set(cb.submit_count.get() + 1);
            self.journal.borrow_mut().submissions.push(cb.commands.clone());
        }
        for s in signal_semaphores {
            debug_assert!(!s.signaled.get(), "semaphore signaled twice");
            s.signaled.set(true);
        }
        if let Some(f) = fence {
            f.signaled.set(true);
        }
        Ok(())
    }

    pub fn wait_idle(&self) {}
}

pub struct TestFence {
    signaled: Cell<bool>,
}

impl TestFence {
    pub fn wait(&self, _timeout_ns: u64) -> Result<WaitResult> {
        if self.signaled.get() {
            Ok(WaitResult::Success)
        } else {
            Ok(WaitResult::Timeout)
        }
    }

    pub fn reset(&self) {
        self.signaled.set(false);
    }
}

pub struct TestSemaphore {
    signaled: Cell<bool>,
}

//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submissions_land_in_the_journal_in_order() {
        let device = TestDevice::new();
        let pipeline = device.create_pipeline(device.create_pipeline_layout(&[]));
        let queue = device.queue();

        let mut cb = device.create_command_buffer();
        cb.begin(CommandBufferUsageFlags::SIMULTANEOUS_USE);
        cb.bind_pipeline(pipeline);
        cb.draw(DrawParams {
            vertex_count: 3,
            instance_count: 1,
            first_vertex: 0,
            first_instance: 0,
        });
        cb.end();

        let fence = device.create_fence();
        queue.submit(&[&cb], &[], &[], Some(&fence)).unwrap();
        queue.submit(&[&cb], &[], &[], None).unwrap();

        assert_eq!(fence.wait(0).unwrap(), WaitResult::Success);
        let journal = device.journal();
        assert_eq!(journal.submissions.len(), 2);
        assert_eq!(journal.submissions[0], journal.submissions[1]);
        assert_eq!(journal.submissions[0][0], TestCmd::BindPipeline(pipeline));
    }

    #[test]
    fn unsignaled_fence_times_out() {
        let device = TestDevice::new();
        let fence = device.create_fence();
        assert_eq!(fence.wait(0).unwrap(), WaitResult::Timeout);
    }
}
