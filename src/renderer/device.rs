use std::sync::Arc;

use log::info;
use vulkano::{
    device::{
        physical::{PhysicalDevice, PhysicalDeviceType, QueueFamily},
        Device, DeviceCreateInfo, DeviceExtensions, Features, Queue, QueueCreateInfo,
    },
    format::Format,
    instance::Instance,
    render_pass::RenderPass,
    swapchain::Surface,
};
use winit::window::Window;

use super::wrapper::DEPTH_FORMAT;
use crate::error::{Error, Result};

pub fn device_extensions() -> DeviceExtensions {
    DeviceExtensions {
        khr_swapchain: true,
        ..DeviceExtensions::none()
    }
}

/// Picks a graphics capable device that can present to `surface`,
/// preferring discrete GPUs.
pub fn select_physical_device<'a>(
    instance: &'a Arc<Instance>,
    extensions: &DeviceExtensions,
    surface: &Arc<Surface<Window>>,
) -> Result<(PhysicalDevice<'a>, QueueFamily<'a>)> {
    PhysicalDevice::enumerate(instance)
        .filter(|&p| p.supported_extensions().is_superset_of(extensions))
        .filter_map(|p| {
            p.queue_families()
                .find(|&q| q.supports_graphics() && q.supports_surface(surface).unwrap_or(false))
                .map(|q| (p, q))
        })
        .min_by_key(|(p, _)| match p.properties().device_type {
            PhysicalDeviceType::DiscreteGpu => 0,
            PhysicalDeviceType::IntegratedGpu => 1,
            PhysicalDeviceType::VirtualGpu => 2,
            PhysicalDeviceType::Cpu => 3,
            PhysicalDeviceType::Other => 4,
        })
        .ok_or_else(|| Error::resource_init("no Vulkan device can present to the window"))
}

/// Creates the logical device with a single graphics queue.
///
/// Point sizes above one pixel need the `large_points` feature, which is
/// enabled whenever the device has it.
pub fn create_device(
    physical_device: PhysicalDevice,
    queue_family: QueueFamily,
) -> Result<(Arc<Device>, Arc<Queue>)> {
    let large_points = physical_device.supported_features().large_points;
    if !large_points {
        info!("device does not support large points, point size is fixed to one pixel");
    }

    let (device, mut queues) = Device::new(
        physical_device,
        DeviceCreateInfo {
            enabled_extensions: device_extensions(),
            queue_create_infos: vec![QueueCreateInfo::family(queue_family)],
            enabled_features: Features {
                large_points,
                ..Features::none()
            },
            ..Default::default()
        },
    )
    .map_err(Error::resource_init)?;

    let queue = queues
        .next()
        .ok_or_else(|| Error::resource_init("device returned no graphics queue"))?;
    Ok((device, queue))
}

pub fn get_render_pass(device: Arc<Device>, swapchain_format: Format) -> Result<Arc<RenderPass>> {
    vulkano::single_pass_renderpass!(
        device,
        attachments: {
            color: {
                load: Clear,
                store: Store,
                format: swapchain_format,
                samples: 1,
            },
            depth: {
                load: Clear,
                store: DontCare,
                format: DEPTH_FORMAT,
                samples: 1,
            }
        },
        pass: {
            color: [color],
            depth_stencil: {depth}
        }
    )
    .map_err(Error::resource_init)
}
